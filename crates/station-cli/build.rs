use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let config_path = manifest_dir.join("station.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config_contents = fs::read_to_string(&config_path)?;
    let table: toml::value::Table = toml::from_str(&config_contents)?;

    let string = |key: &str| {
        table
            .get(key)
            .and_then(|value| value.as_str())
            .unwrap_or_else(|| panic!("station.toml must define `{}` as a string", key))
    };
    let integer = |key: &str| {
        table
            .get(key)
            .and_then(|value| value.as_integer())
            .unwrap_or_else(|| panic!("station.toml must define `{}` as an integer", key))
    };
    let boolean = |key: &str| {
        table
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or_else(|| panic!("station.toml must define `{}` as a boolean", key))
    };

    let endpoints: Vec<&str> = table
        .get("endpoints")
        .and_then(|value| value.as_array())
        .unwrap_or_else(|| panic!("station.toml must define `endpoints` as an array"))
        .iter()
        .map(|value| {
            value
                .as_str()
                .unwrap_or_else(|| panic!("`endpoints` must only hold strings"))
        })
        .collect();

    let uid_format = match string("uid_format") {
        "spaced" => "Spaced",
        "compact" => "Compact",
        other => panic!("unknown uid_format `{}` (spaced or compact)", other),
    };

    let root_ca = match table.get("root_ca").and_then(|value| value.as_str()) {
        Some(path) => {
            let pem_path = manifest_dir.join(path);
            println!("cargo:rerun-if-changed={}", pem_path.display());
            Some(fs::read_to_string(&pem_path)?)
        }
        None => None,
    };

    let generated = format!(
        "pub const WIFI_SSID: &str = {wifi_ssid:?};\n\
         pub const WIFI_PASS: &str = {wifi_pass:?};\n\
         pub const ENDPOINTS: &[&str] = &{endpoints:?};\n\
         pub const UID_FORMAT: station_core::UidFormat = station_core::UidFormat::{uid_format};\n\
         pub const ROOT_CA_PEM: Option<&str> = {root_ca:?};\n\
         pub const SS_PIN: u8 = {ss_pin};\n\
         pub const RST_PIN: u8 = {rst_pin};\n\
         pub const SPI_BAUDRATE: u32 = {spi_baudrate};\n\
         pub const REQUEST_TIMEOUT_MS: u64 = {request_timeout_ms};\n\
         pub const POLL_INTERVAL_MS: u64 = {poll_interval_ms};\n\
         pub const DISPLAY: bool = {display};\n\
         pub const DISPLAY_HOLD_MS: u64 = {display_hold_ms};\n\
         pub const OFFLINE: bool = {offline};\n",
        wifi_ssid = string("wifi_ssid"),
        wifi_pass = string("wifi_pass"),
        ss_pin = u8::try_from(integer("ss_pin"))?,
        rst_pin = u8::try_from(integer("rst_pin"))?,
        spi_baudrate = u32::try_from(integer("spi_baudrate"))?,
        request_timeout_ms = u64::try_from(integer("request_timeout_ms"))?,
        poll_interval_ms = u64::try_from(integer("poll_interval_ms"))?,
        display = boolean("display"),
        display_hold_ms = u64::try_from(integer("display_hold_ms"))?,
        offline = boolean("offline"),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::write(out_dir.join("app_config.rs"), generated)?;

    Ok(())
}

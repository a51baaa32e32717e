//! RFID attendance station for host runs.
//!
//! Configuration is compiled in from `station.toml`. Cards come from stdin
//! through the emulated reader; reports go out over HTTPS.

mod emulated;

mod app_config {
    include!(concat!(env!("OUT_DIR"), "/app_config.rs"));
}

use anyhow::{Context, Result};
use station_controller::{NoDisplay, Station, VirtualDisplay};
use station_core::{EndpointConfig, PinConfig, StationConfig, WifiCredentials};
use station_hardware::devices::AnyNetworkLink;
use station_hardware::mock::{MockLink, MockReader};
use station_hardware::reader::CardReader;
use station_hardware::traits::StatusDisplay;
use station_hardware::HostLink;
use station_network::{HttpsTransport, HttpsTransportConfig, ReportClient};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn station_config() -> station_core::Result<StationConfig> {
    let endpoints = EndpointConfig::new(
        app_config::ENDPOINTS
            .iter()
            .map(|url| url.to_string())
            .collect(),
    )?;

    StationConfig::builder()
        .wifi(WifiCredentials::new(app_config::WIFI_SSID, app_config::WIFI_PASS))
        .endpoints(endpoints)
        .uid_format(app_config::UID_FORMAT)
        .pins(PinConfig {
            ss: app_config::SS_PIN,
            rst: app_config::RST_PIN,
            spi_baudrate: app_config::SPI_BAUDRATE,
        })
        .root_ca_pem(app_config::ROOT_CA_PEM.map(str::to_string))
        .request_timeout_ms(app_config::REQUEST_TIMEOUT_MS)
        .poll_interval_ms(app_config::POLL_INTERVAL_MS)
        .display_enabled(app_config::DISPLAY)
        .display_hold_ms(app_config::DISPLAY_HOLD_MS)
        .build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = station_core::VERSION, "RFID station starting");

    let config = station_config().context("invalid station.toml")?;
    info!(
        endpoints = ?config.endpoints.iter().collect::<Vec<_>>(),
        uid_format = ?config.uid_format,
        display = config.display_enabled,
        "Configuration loaded"
    );

    let transport = HttpsTransport::new(HttpsTransportConfig {
        root_ca_pem: config.root_ca_pem.clone(),
        timeout: config.request_timeout(),
    })
    .context("cannot set up HTTPS transport")?;
    let client = ReportClient::new(transport, config.uid_format);

    let link = if app_config::OFFLINE {
        let (link, _) = MockLink::new();
        AnyNetworkLink::Mock(link)
    } else {
        let (host, port) = config
            .endpoints
            .primary_target()
            .context("first endpoint has no host")?;
        AnyNetworkLink::Host(HostLink::new(host, port, config.wifi.ssid.clone()))
    };

    let display: Box<dyn StatusDisplay> = if config.display_enabled {
        Box::new(VirtualDisplay::default())
    } else {
        Box::new(NoDisplay)
    };

    let (device, cards) = MockReader::with_name("Emulated MFRC522 (stdin)");
    tokio::spawn(emulated::feed_stdin(cards));

    let mut station = Station::new(config, CardReader::new(device), client, display, link);

    if let Err(e) = station.start().await {
        error!(error = %e, "Initialisation failed; station halted");
        shutdown_signal().await;
        return Err(e).context("station initialisation");
    }

    station.run_until(shutdown_signal()).await;

    let stats = station.stats();
    info!(
        polls = stats.polls,
        cards = stats.cards_read,
        successes = stats.successes,
        not_found = stats.not_found,
        transport_errors = stats.transport_errors,
        "Station stopped"
    );
    Ok(())
}

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod types;
pub mod uid;

pub use config::{EndpointConfig, PinConfig, StationConfig, WifiCredentials};
pub use error::{Error, Result};
pub use format::UidFormat;
pub use types::*;
pub use uid::Uid;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

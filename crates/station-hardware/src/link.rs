//! Network link for host builds.
//!
//! On the device the link is the Wi-Fi association. On a host the network
//! is already up, so "connected" means the report server's host name
//! resolves.

use crate::error::{HardwareError, Result};
use crate::traits::NetworkLink;
use crate::types::DeviceInfo;
use std::time::Duration;
use tokio::net::lookup_host;
use tracing::{debug, warn};

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Link that checks name resolution of the report server.
#[derive(Debug, Clone)]
pub struct HostLink {
    host: String,
    port: u16,
    network: String,
    connected: bool,
}

impl HostLink {
    /// Link to `host` on `port`; `network` is only used for logging (the
    /// SSID the device would join).
    pub fn new(host: impl Into<String>, port: u16, network: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            network: network.into(),
            connected: false,
        }
    }

    async fn resolve_server(&self) -> Result<()> {
        let target = format!("{}:{}", self.host, self.port);
        match tokio::time::timeout(RESOLVE_TIMEOUT, lookup_host(target.as_str())).await {
            Ok(Ok(mut addrs)) => match addrs.next() {
                Some(addr) => {
                    debug!(host = %self.host, %addr, "Report server resolved");
                    Ok(())
                }
                None => Err(HardwareError::link(format!("{} has no address", self.host))),
            },
            Ok(Err(e)) => Err(HardwareError::link(format!(
                "cannot resolve {}: {e}",
                self.host
            ))),
            Err(_) => Err(HardwareError::link(format!(
                "resolving {} timed out",
                self.host
            ))),
        }
    }
}

impl NetworkLink for HostLink {
    async fn connect(&mut self) -> Result<()> {
        let result = self.resolve_server().await;
        self.connected = result.is_ok();
        result
    }

    async fn is_connected(&mut self) -> bool {
        match self.resolve_server().await {
            Ok(()) => self.connected = true,
            Err(e) => {
                if self.connected {
                    warn!(network = %self.network, error = %e, "Network link lost");
                }
                self.connected = false;
            }
        }
        self.connected
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(format!("Host link ({})", self.network), "host-dns")
    }
}

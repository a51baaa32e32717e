//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Rust Edition 2024) are not
//! object-safe, so a `Box<dyn NetworkLink>` is not possible. The binary picks
//! its link at start-up through the enum below instead, keeping static
//! dispatch.
//!
//! # Examples
//!
//! ```
//! use station_hardware::devices::AnyNetworkLink;
//! use station_hardware::mock::MockLink;
//!
//! let (link, _handle) = MockLink::new();
//! let any_link = AnyNetworkLink::Mock(link);
//! ```

use crate::link::HostLink;
use crate::mock::MockLink;
use crate::traits::NetworkLink;
use crate::{DeviceInfo, Result};

/// Enum wrapper for network link dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNetworkLink {
    /// Name resolution of the report server on a host.
    Host(HostLink),
    /// Mock link for development and testing.
    Mock(MockLink),
}

impl NetworkLink for AnyNetworkLink {
    async fn connect(&mut self) -> Result<()> {
        match self {
            Self::Host(link) => link.connect().await,
            Self::Mock(link) => link.connect().await,
        }
    }

    async fn is_connected(&mut self) -> bool {
        match self {
            Self::Host(link) => link.is_connected().await,
            Self::Mock(link) => link.is_connected().await,
        }
    }

    fn device_info(&self) -> DeviceInfo {
        match self {
            Self::Host(link) => link.device_info(),
            Self::Mock(link) => link.device_info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_network_link_mock() {
        let (link, handle) = MockLink::new();
        let mut any_link = AnyNetworkLink::Mock(link);

        any_link.connect().await.unwrap();
        assert!(any_link.is_connected().await);
        assert_eq!(handle.attempts(), 1);
        assert_eq!(any_link.device_info().name, "Mock Link");
    }
}

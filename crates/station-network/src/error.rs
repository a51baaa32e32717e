//! Errors raised while delivering a report.
//!
//! None of these reach the polling loop: [`ReportClient`](crate::ReportClient)
//! logs them and turns them into
//! [`LookupResult::TransportError`](station_core::LookupResult::TransportError).

use thiserror::Error;

/// Errors that can occur while posting a report
#[derive(Debug, Error)]
pub enum TransportError {
    /// The pinned root certificate could not be parsed
    #[error("Invalid root certificate: {0}")]
    InvalidCertificate(String),

    /// The HTTPS client could not be built
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    /// Request did not complete within the timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Connection, TLS or protocol failure
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::ClientSetup(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

//! Network reporting layer for the RFID station
//!
//! This crate delivers card UIDs to the attendance/parking server over
//! HTTPS and classifies the answers.
//!
//! # Components
//!
//! - **ReportClient**: fallback algorithm over an ordered endpoint list
//! - **Transport**: seam for the HTTP layer; **HttpsTransport** is the
//!   `reqwest` implementation with an optional pinned root certificate
//! - **ReportPayload** / **HttpResponse**: request body and response
//!   classification
//!
//! # Example
//!
//! ```no_run
//! use station_core::{EndpointConfig, Uid, UidFormat};
//! use station_network::{HttpsTransport, HttpsTransportConfig, ReportClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpsTransport::new(HttpsTransportConfig {
//!     root_ca_pem: None,
//!     timeout: Duration::from_secs(10),
//! })?;
//! let client = ReportClient::new(transport, UidFormat::Spaced);
//!
//! let uid: Uid = "04A13B7E".parse()?;
//! let outcome = client.report(&uid, &EndpointConfig::attendance()).await;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod payload;
mod transport;

pub use client::ReportClient;
pub use error::TransportError;
pub use payload::{HttpResponse, ReportPayload};
pub use transport::{HttpsTransport, HttpsTransportConfig, Transport};

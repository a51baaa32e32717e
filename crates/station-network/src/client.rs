//! Report client: one POST per endpoint, check-then-register fallback.
//!
//! # Architecture
//!
//! ```text
//! Station
//!     │
//!     └─> ReportClient ──> Transport ───(HTTPS)───> check endpoint
//!                              │
//!                              └──────(HTTPS)───> register endpoint (fallback)
//! ```
//!
//! # Design Principles
//!
//! - **No retry**: a single POST per endpoint and report
//! - **No escalation**: failures are logged and become
//!   [`LookupResult::TransportError`]
//! - **Same payload**: the fallback endpoint receives exactly the body sent
//!   to the first one

use crate::payload::ReportPayload;
use crate::transport::Transport;
use station_core::{EndpointConfig, LookupResult, Uid, UidFormat};
use tracing::{error, info, warn};

/// Client delivering UID reports to the configured endpoints.
///
/// # Example
///
/// ```no_run
/// use station_core::{EndpointConfig, Uid, UidFormat};
/// use station_network::{HttpsTransport, HttpsTransportConfig, ReportClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpsTransport::new(HttpsTransportConfig::default())?;
/// let client = ReportClient::new(transport, UidFormat::Spaced);
///
/// let uid = Uid::new(vec![0x04, 0xA1, 0x3B, 0x7E])?;
/// let outcome = client.report(&uid, &EndpointConfig::check_then_register()).await;
/// println!("{outcome}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReportClient<T> {
    transport: T,
    format: UidFormat,
}

impl<T: Transport> ReportClient<T> {
    /// Create a client posting UIDs rendered with `format`.
    pub fn new(transport: T, format: UidFormat) -> Self {
        Self { transport, format }
    }

    /// UID rendering used for payloads.
    pub fn format(&self) -> UidFormat {
        self.format
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Report `uid` to `endpoints` and classify the outcome.
    ///
    /// With a single endpoint exactly one POST is made. With two or more,
    /// the next endpoint is tried (same payload) after `NotFound` or a
    /// transport failure; the first `Success` ends the report. The outcome of
    /// the last attempt is returned otherwise.
    pub async fn report(&self, uid: &Uid, endpoints: &EndpointConfig) -> LookupResult {
        let payload = ReportPayload::new(uid, self.format);
        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to encode report payload");
                return LookupResult::TransportError;
            }
        };

        let fallback = endpoints.has_fallback();
        let mut outcome = LookupResult::TransportError;

        for (attempt, endpoint) in endpoints.iter().enumerate() {
            outcome = self.post(endpoint, &body).await;

            match &outcome {
                LookupResult::Success { .. } => break,
                LookupResult::NotFound if !fallback => {
                    info!(endpoint, "UID not found");
                    break;
                }
                LookupResult::TransportError if !fallback => break,
                _ => {
                    if attempt + 1 < endpoints.len() {
                        info!(endpoint, result = %outcome, "Trying next endpoint");
                    }
                }
            }
        }

        outcome
    }

    async fn post(&self, endpoint: &str, body: &str) -> LookupResult {
        match self.transport.post_json(endpoint, body).await {
            Ok(response) => {
                let outcome = response.classify();
                info!(
                    endpoint,
                    payload = body,
                    status = response.status,
                    response = %response.body,
                    result = %outcome,
                    "Report sent"
                );
                outcome
            }
            Err(e) => {
                warn!(endpoint, payload = body, error = %e, "Report failed");
                LookupResult::TransportError
            }
        }
    }
}

//! HTTPS transport.
//!
//! [`Transport`] is the seam between the fallback algorithm and the network.
//! [`HttpsTransport`] is the real implementation: one `reqwest` client per
//! request, trusting either a single pinned root certificate or the
//! built-in webpki roots. The client (and with it the TLS session) is
//! dropped when `post_json` returns, whatever the outcome.

#![allow(async_fn_in_trait)]

use crate::error::TransportError;
use crate::payload::HttpResponse;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Client};
use std::time::Duration;
use tracing::{debug, trace};

const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";

/// Something that can POST a JSON body to a URL.
pub trait Transport {
    /// POST `body` with `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns an error for connection, TLS and timeout failures. Any HTTP
    /// status, including error statuses, is a successful transport result.
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError>;
}

/// Configuration for [`HttpsTransport`]
///
/// # Example
///
/// ```
/// use station_network::HttpsTransportConfig;
/// use std::time::Duration;
///
/// let config = HttpsTransportConfig {
///     root_ca_pem: None,
///     timeout: Duration::from_secs(10),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct HttpsTransportConfig {
    /// Root certificate (PEM) to trust exclusively; `None` uses the
    /// built-in roots
    pub root_ca_pem: Option<String>,

    /// Timeout for the whole request (connect, TLS, send, receive)
    pub timeout: Duration,
}

impl Default for HttpsTransportConfig {
    fn default() -> Self {
        Self {
            root_ca_pem: None,
            timeout: Duration::from_millis(station_core::constants::DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// `reqwest`-based HTTPS transport.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    root_ca: Option<Certificate>,
    timeout: Duration,
}

impl HttpsTransport {
    /// Create a transport, checking the pinned certificate once by building
    /// a throwaway client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidCertificate`] if the PEM is rejected
    /// or holds no certificate block.
    pub fn new(config: HttpsTransportConfig) -> Result<Self, TransportError> {
        let root_ca = match &config.root_ca_pem {
            Some(pem) => Some(parse_root_ca(pem)?),
            None => None,
        };

        debug!(
            pinned_root = root_ca.is_some(),
            timeout_ms = config.timeout.as_millis() as u64,
            "HTTPS transport configured"
        );

        let transport = Self {
            root_ca,
            timeout: config.timeout,
        };
        if let Err(e) = transport.client() {
            return Err(match transport.root_ca {
                Some(_) => TransportError::InvalidCertificate(e.to_string()),
                None => e,
            });
        }

        Ok(transport)
    }

    /// Timeout applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client(&self) -> Result<Client, TransportError> {
        let mut builder = Client::builder().timeout(self.timeout).use_rustls_tls();
        if let Some(root) = &self.root_ca {
            builder = builder
                .tls_built_in_root_certs(false)
                .add_root_certificate(root.clone());
        }
        Ok(builder.build()?)
    }
}

// Text without a certificate block parses to zero roots, which would leave
// the client trusting nothing.
fn parse_root_ca(pem: &str) -> Result<Certificate, TransportError> {
    if !pem.contains(PEM_CERTIFICATE_BEGIN) {
        return Err(TransportError::InvalidCertificate(
            "no PEM certificate block".to_string(),
        ));
    }
    Certificate::from_pem(pem.as_bytes())
        .map_err(|e| TransportError::InvalidCertificate(e.to_string()))
}

impl Transport for HttpsTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        let client = self.client()?;

        trace!(url, body, "POST");
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.request_error(e))?;

        Ok(HttpResponse::new(status, text))
    }
}

impl HttpsTransport {
    fn request_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis() as u64)
        } else {
            e.into()
        }
    }
}

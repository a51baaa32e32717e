use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Card identity errors
    #[error("Invalid UID length: expected {min}-{max} bytes, got {actual}")]
    InvalidUidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid UID text '{input}': {reason}")]
    InvalidUidText { input: String, reason: String },

    // Endpoint errors
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("At least one report endpoint is required")]
    NoEndpoints,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_length_error_display() {
        let error = Error::InvalidUidLength {
            min: 4,
            max: 10,
            actual: 2,
        };
        assert_eq!(
            error.to_string(),
            "Invalid UID length: expected 4-10 bytes, got 2"
        );
    }

    #[test]
    fn test_endpoint_error_display() {
        let error = Error::InvalidEndpoint {
            url: "ftp://x".to_string(),
            reason: "unsupported scheme".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid endpoint URL 'ftp://x': unsupported scheme"
        );
    }
}

//! Error types for hardware operations.
//!
//! This module defines error types specific to the station peripherals:
//! the MFRC522 card reader, the status display and the network link.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Bus (SPI/I2C) communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Card reading error (anticollision, select, halt).
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// More than one card answered during anticollision.
    #[error("Collision detected during anticollision")]
    Collision,

    /// Display drawing or flush error.
    #[error("Display error: {message}")]
    DisplayError { message: String },

    /// Network link could not be brought up.
    #[error("Link error: {message}")]
    LinkError { message: String },

    /// Invalid UID or configuration value.
    #[error(transparent)]
    Core(#[from] station_core::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new card read error.
    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    /// Create a new display error.
    pub fn display(message: impl Into<String>) -> Self {
        Self::DisplayError {
            message: message.into(),
        }
    }

    /// Create a new link error.
    pub fn link(message: impl Into<String>) -> Self {
        Self::LinkError {
            message: message.into(),
        }
    }

    /// Whether the error means the card simply could not be read this cycle.
    ///
    /// Such errors are reported as "no card" by the reader so the loop keeps
    /// polling; everything else is a fault of the reader itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Collision | Self::CardReadError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("MFRC522");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: MFRC522");
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(36);
        assert!(matches!(error, HardwareError::Timeout { .. }));
        assert_eq!(error.to_string(), "Operation timeout after 36ms");
    }

    #[test]
    fn test_collision_error() {
        let error = HardwareError::Collision;
        assert_eq!(error.to_string(), "Collision detected during anticollision");
    }

    #[test]
    fn test_core_error_conversion() {
        let error: HardwareError = station_core::Error::NoEndpoints.into();
        assert!(matches!(error, HardwareError::Core(_)));
    }

    #[rstest]
    #[case(HardwareError::timeout(25), true)]
    #[case(HardwareError::Collision, true)]
    #[case(HardwareError::card_read("BCC mismatch"), true)]
    #[case(HardwareError::communication("SPI bus fault"), false)]
    #[case(HardwareError::initialization_failed("no version"), false)]
    #[case(HardwareError::display("flush failed"), false)]
    fn test_is_transient(#[case] error: HardwareError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }
}

//! Errors surfaced by the station controller.

use station_hardware::HardwareError;
use station_network::TransportError;
use thiserror::Error;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, StationError>;

/// Errors that can occur while starting or running the station.
#[derive(Debug, Error)]
pub enum StationError {
    /// Transition not allowed by the polling state machine.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Peripheral failure (reader, display, link).
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Transport could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] station_core::Error),
}

impl StationError {
    /// Errors after which the station cannot run at all.
    pub fn is_initialization_failure(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Transport(_)
                | Self::Hardware(HardwareError::InitializationFailed { .. })
        )
    }
}

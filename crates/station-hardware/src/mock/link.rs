//! Mock network link.

use crate::error::{HardwareError, Result};
use crate::traits::NetworkLink;
use crate::types::DeviceInfo;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock network link that comes up after a configurable number of attempts.
///
/// # Examples
///
/// ```
/// use station_hardware::mock::MockLink;
/// use station_hardware::traits::NetworkLink;
///
/// #[tokio::main]
/// async fn main() {
///     let (mut link, handle) = MockLink::failing_attempts(2);
///
///     assert!(link.connect().await.is_err());
///     assert!(link.connect().await.is_err());
///     assert!(link.connect().await.is_ok());
///     assert!(link.is_connected().await);
///     assert_eq!(handle.attempts(), 3);
/// }
/// ```
#[derive(Debug)]
pub struct MockLink {
    state: Arc<Mutex<MockLinkState>>,
}

#[derive(Debug, Default)]
struct MockLinkState {
    up: bool,
    failures_left: usize,
    attempts: usize,
}

fn lock(state: &Mutex<MockLinkState>) -> MutexGuard<'_, MockLinkState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockLink {
    /// Link that comes up on the first attempt.
    pub fn new() -> (Self, MockLinkHandle) {
        Self::failing_attempts(0)
    }

    /// Link whose first `failures` connection attempts fail.
    pub fn failing_attempts(failures: usize) -> (Self, MockLinkHandle) {
        let state = Arc::new(Mutex::new(MockLinkState {
            failures_left: failures,
            ..MockLinkState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockLinkHandle { state },
        )
    }
}

impl NetworkLink for MockLink {
    async fn connect(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(HardwareError::link("association pending"));
        }
        state.up = true;
        Ok(())
    }

    async fn is_connected(&mut self) -> bool {
        lock(&self.state).up
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock Link", "Mock")
    }
}

/// Handle for controlling a mock link.
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    state: Arc<Mutex<MockLinkState>>,
}

impl MockLinkHandle {
    /// Force the link state (e.g. simulate the access point going away).
    pub fn set_up(&self, up: bool) {
        lock(&self.state).up = up;
    }

    /// Number of connection attempts made.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }
}

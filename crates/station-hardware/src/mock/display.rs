//! Mock status display that records every frame shown.

use crate::error::{HardwareError, Result};
use crate::traits::StatusDisplay;
use crate::types::DeviceInfo;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock status display.
///
/// # Examples
///
/// ```
/// use station_hardware::mock::MockDisplay;
/// use station_hardware::traits::StatusDisplay;
///
/// let (mut display, handle) = MockDisplay::new();
/// display.show("Scanning").unwrap();
/// assert_eq!(handle.last().as_deref(), Some("Scanning"));
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    state: Arc<Mutex<MockDisplayState>>,
}

#[derive(Debug, Default)]
struct MockDisplayState {
    frames: Vec<String>,
    fail_init: bool,
    initialised: bool,
}

fn lock(state: &Mutex<MockDisplayState>) -> MutexGuard<'_, MockDisplayState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDisplay {
    /// Create a new mock display and its handle.
    pub fn new() -> (Self, MockDisplayHandle) {
        let state = Arc::new(Mutex::new(MockDisplayState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDisplayHandle { state },
        )
    }

    /// Create a mock display whose initialisation fails.
    pub fn failing() -> (Self, MockDisplayHandle) {
        let (display, handle) = Self::new();
        lock(&display.state).fail_init = true;
        (display, handle)
    }
}

impl StatusDisplay for MockDisplay {
    fn init(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_init {
            return Err(HardwareError::initialization_failed(
                "SSD1306 allocation failed",
            ));
        }
        state.initialised = true;
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<()> {
        lock(&self.state).frames.push(text.to_string());
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock Display", "Mock")
    }
}

/// Handle for inspecting a mock display.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    state: Arc<Mutex<MockDisplayState>>,
}

impl MockDisplayHandle {
    /// All frames shown so far, oldest first.
    pub fn frames(&self) -> Vec<String> {
        lock(&self.state).frames.clone()
    }

    /// The frame currently on screen.
    pub fn last(&self) -> Option<String> {
        lock(&self.state).frames.last().cloned()
    }

    /// Whether `init` succeeded.
    pub fn is_initialised(&self) -> bool {
        lock(&self.state).initialised
    }
}

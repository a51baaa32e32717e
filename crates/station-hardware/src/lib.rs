//! Hardware abstraction layer for the RFID attendance station.
//!
//! This crate provides trait-based abstractions for the station
//! peripherals (the MFRC522 card reader, the status display and the network
//! link) together with an adapter for the `mfrc522` driver and mock devices,
//! so the polling loop runs unchanged on the device, on a host and in tests.
//!
//! # Card reader
//!
//! [`ReaderDevice`] is the chip-level contract (REQA, anticollision +
//! SELECT, HLTA, Crypto1 off). [`CardReader`] adds the station policy on top:
//! only MIFARE Classic cards are handed out.
//!
//! ```
//! use station_hardware::mock::MockReader;
//! use station_hardware::CardReader;
//!
//! let (device, handle) = MockReader::new();
//! let mut reader = CardReader::new(device);
//!
//! // Ultralight (SAK 0x00) is rejected
//! handle.tap(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66], 0x00).unwrap();
//! assert!(reader.poll_for_card().unwrap().is_none());
//!
//! // MIFARE Classic 1K is accepted
//! handle.tap(vec![0x04, 0xA1, 0x3B, 0x7E], 0x08).unwrap();
//! assert!(reader.poll_for_card().unwrap().is_some());
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type. Errors for which
//! [`HardwareError::is_transient`] holds are swallowed by [`CardReader`] and
//! become "no card this cycle".
//!
//! [`ReaderDevice`]: traits::ReaderDevice

pub mod devices;
pub mod error;
pub mod link;
pub mod mfrc522;
pub mod mock;
pub mod reader;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use link::HostLink;
pub use crate::mfrc522::Mfrc522Reader;
pub use reader::CardReader;
pub use traits::{CardData, NetworkLink, ReaderDevice, SelectedCard, StatusDisplay};
pub use types::{ChipVersion, DeviceInfo, PiccType, ReaderInfo};

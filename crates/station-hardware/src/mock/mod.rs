//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. Each mock comes
//! with a cloneable handle used to drive it and to inspect what the station
//! did with it. [`MockMfrc522Chip`] sits one layer lower: it is the SPI
//! device under the real reader adapter.

pub mod display;
pub mod link;
pub mod reader;
pub mod spi;

// Re-export commonly used types
pub use display::{MockDisplay, MockDisplayHandle};
pub use link::{MockLink, MockLinkHandle};
pub use reader::{MockReader, MockReaderHandle};
pub use spi::MockMfrc522Chip;

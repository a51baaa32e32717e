//! Station controller: duplicate classification, status display and the
//! polling loop tying the reader, the report client and the network link
//! together.

pub mod display;
pub mod error;
pub mod filter;
pub mod oled;
pub mod state_machine;
pub mod station;

pub use display::{
    NoDisplay, VirtualDisplay, VirtualDisplayBuilder, layout_text, pad_line, truncate_text,
};
pub use error::{Result, StationError};
pub use filter::{Classification, DuplicateFilter};
pub use oled::{FlushDisplay, OledDisplay};
pub use state_machine::{PollState, PollStateMachine, StateTransition};
pub use station::{CardReport, PollOutcome, Station, StationStats};

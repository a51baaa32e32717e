//! Duplicate classification of consecutive card reads.
//!
//! The filter only labels reads; a repeated card is still reported. There
//! is no cooldown: a card resting on the reader is classified
//! [`Classification::SameAsLast`] on every poll and reported every time.

use serde::{Deserialize, Serialize};
use station_core::Uid;
use std::fmt;

/// Label attached to each accepted read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// UID differs from the previous read.
    New,
    /// UID equals the previous read.
    SameAsLast,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::SameAsLast => write!(f, "SameAsLast"),
        }
    }
}

/// Remembers the last UID seen.
///
/// Starts as four zero bytes; never reset on card removal.
///
/// # Examples
///
/// ```
/// use station_controller::{Classification, DuplicateFilter};
/// use station_core::Uid;
///
/// let mut filter = DuplicateFilter::new();
/// let uid = Uid::new(vec![0x04, 0xA1, 0x3B, 0x7E]).unwrap();
///
/// assert_eq!(filter.classify(&uid), Classification::New);
/// assert_eq!(filter.classify(&uid), Classification::SameAsLast);
/// ```
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    last_seen: Uid,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self {
            last_seen: Uid::zeroed(),
        }
    }

    /// Compare `uid` with the last one seen; a differing UID replaces it.
    pub fn classify(&mut self, uid: &Uid) -> Classification {
        if *uid == self.last_seen {
            Classification::SameAsLast
        } else {
            self.last_seen = uid.clone();
            Classification::New
        }
    }

    pub fn last_seen(&self) -> &Uid {
        &self.last_seen
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new()
    }
}

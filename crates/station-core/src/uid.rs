use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    Error, Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    format,
};

/// Card unique identifier (4-10 bytes).
///
/// A UID identifies a physical card only while it stays near the reader; it
/// is never persisted. Equality is byte-wise and constant-time.
///
/// # Examples
///
/// ```
/// use station_core::Uid;
///
/// let uid = Uid::new(vec![0x04, 0xA1, 0x3B, 0x7E]).unwrap();
/// assert_eq!(uid.to_string(), "04A13B7E");
/// assert_eq!(uid.hex_spaced(), " 04 A1 3B 7E");
/// assert_eq!(" 04 A1 3B 7E".parse::<Uid>().unwrap(), uid);
/// ```
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Uid(Vec<u8>);

impl Uid {
    /// Create a UID with length validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidLength` if the length is outside 4-10 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidUidLength {
                min: MIN_UID_LENGTH,
                max: MAX_UID_LENGTH,
                actual: len,
            });
        }
        Ok(Uid(bytes))
    }

    /// Create a UID from a byte slice.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidLength` if the length is outside 4-10 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.to_vec())
    }

    /// The all-zero single size UID a station starts with before any read.
    #[must_use]
    pub fn zeroed() -> Self {
        Uid(vec![0; MIN_UID_LENGTH])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `" 04 A1 3B 7E"`
    #[must_use]
    pub fn hex_spaced(&self) -> String {
        format::hex_spaced(&self.0)
    }

    /// `" 4 161 59 126"`
    #[must_use]
    pub fn decimal_spaced(&self) -> String {
        format::decimal_spaced(&self.0)
    }
}

impl PartialEq for Uid {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::hash::Hash for Uid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format::hex_compact(&self.0))
    }
}

impl std::str::FromStr for Uid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uid::new(format::parse_hex(s)?)
    }
}

impl TryFrom<Vec<u8>> for Uid {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Uid::new(bytes)
    }
}

impl From<Uid> for Vec<u8> {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl AsRef<[u8]> for Uid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

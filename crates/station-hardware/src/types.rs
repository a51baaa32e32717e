//! Common types shared across hardware device implementations.
//!
//! This module defines the PICC type classification, the reader chip
//! version and descriptive device information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic device information.
///
/// Contains metadata about a peripheral such as the display or the network
/// link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "SSD1306", "Mock Display").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Version of the reader chip, read from `VersionReg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipVersion {
    /// FM17522 clone (0x88).
    Fm17522,
    /// MFRC522 version 0.0 (0x90).
    V0_0,
    /// MFRC522 version 1.0 (0x91).
    V1_0,
    /// MFRC522 version 2.0 (0x92).
    V2_0,
    /// Known counterfeit (0x12).
    Counterfeit,
    /// Any other register value.
    Unknown(u8),
}

impl ChipVersion {
    /// Decode the raw `VersionReg` value.
    pub fn from_register(value: u8) -> Self {
        match value {
            0x88 => Self::Fm17522,
            0x90 => Self::V0_0,
            0x91 => Self::V1_0,
            0x92 => Self::V2_0,
            0x12 => Self::Counterfeit,
            other => Self::Unknown(other),
        }
    }

    /// The raw register value.
    pub fn register(&self) -> u8 {
        match self {
            Self::Fm17522 => 0x88,
            Self::V0_0 => 0x90,
            Self::V1_0 => 0x91,
            Self::V2_0 => 0x92,
            Self::Counterfeit => 0x12,
            Self::Unknown(value) => *value,
        }
    }

    /// A version register of 0x00 or 0xFF means the chip did not answer.
    pub fn is_responding(&self) -> bool {
        !matches!(self, Self::Unknown(0x00) | Self::Unknown(0xFF))
    }
}

impl fmt::Display for ChipVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fm17522 => write!(f, "0x88 = clone"),
            Self::V0_0 => write!(f, "0x90 = v0.0"),
            Self::V1_0 => write!(f, "0x91 = v1.0"),
            Self::V2_0 => write!(f, "0x92 = v2.0"),
            Self::Counterfeit => write!(f, "0x12 = counterfeit chip"),
            Self::Unknown(value) => write!(f, "0x{value:02X} = (unknown)"),
        }
    }
}

/// RFID reader information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "MFRC522").
    pub name: String,

    /// Chip version, when the reader exposes one.
    pub chip_version: Option<ChipVersion>,

    /// List of supported protocols (e.g., ["ISO14443A"]).
    pub protocols: Vec<String>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, protocols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            chip_version: None,
            protocols,
        }
    }

    /// Set the chip version.
    pub fn with_chip_version(mut self, version: ChipVersion) -> Self {
        self.chip_version = Some(version);
        self
    }
}

/// Card (PICC) family, derived from the SAK byte returned by SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PiccType {
    /// SAK indicates the UID is not complete.
    NotComplete,
    /// MIFARE Mini, 320 bytes.
    MifareMini,
    /// MIFARE Classic 1KB.
    Mifare1K,
    /// MIFARE Classic 4KB.
    Mifare4K,
    /// MIFARE Ultralight or Ultralight C.
    MifareUltralight,
    /// MIFARE Plus.
    MifarePlus,
    /// MIFARE DESFire.
    MifareDesfire,
    /// MIFARE TNP3XXX.
    Tnp3xxx,
    /// PICC compliant with ISO/IEC 14443-4.
    Iso14443_4,
    /// PICC compliant with ISO/IEC 18092 (NFC).
    Iso18092,
    /// Anything else.
    Unknown,
}

impl PiccType {
    /// Classify a SAK byte. Bit 7 is ignored.
    pub fn from_sak(sak: u8) -> Self {
        match sak & 0x7F {
            0x04 => Self::NotComplete,
            0x09 => Self::MifareMini,
            0x08 => Self::Mifare1K,
            0x18 => Self::Mifare4K,
            0x00 => Self::MifareUltralight,
            0x10 | 0x11 => Self::MifarePlus,
            0x01 => Self::Tnp3xxx,
            0x20 => Self::Iso14443_4,
            0x40 => Self::Iso18092,
            _ => Self::Unknown,
        }
    }

    /// Human readable name, as printed on the console for each card.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotComplete => "SAK indicates UID is not complete.",
            Self::MifareMini => "MIFARE Mini, 320 bytes",
            Self::Mifare1K => "MIFARE 1KB",
            Self::Mifare4K => "MIFARE 4KB",
            Self::MifareUltralight => "MIFARE Ultralight or Ultralight C",
            Self::MifarePlus => "MIFARE Plus",
            Self::MifareDesfire => "MIFARE DESFire",
            Self::Tnp3xxx => "MIFARE TNP3XXX",
            Self::Iso14443_4 => "PICC compliant with ISO/IEC 14443-4",
            Self::Iso18092 => "PICC compliant with ISO/IEC 18092 (NFC)",
            Self::Unknown => "Unknown type",
        }
    }

    /// Only Mini, 1K and 4K are MIFARE Classic cards.
    pub fn is_mifare_classic(&self) -> bool {
        matches!(self, Self::MifareMini | Self::Mifare1K | Self::Mifare4K)
    }
}

impl fmt::Display for PiccType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

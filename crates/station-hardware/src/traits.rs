//! Hardware device trait definitions.
//!
//! This module defines the capability traits the station core talks to: the
//! card reader chip, the status display and the network link. Mock and real
//! implementations are interchangeable behind them.
//!
//! Reader and display calls are synchronous (blocking SPI/I2C transfers that
//! complete in microseconds). The network link uses native `async fn`
//! methods (Rust 1.90 + Edition 2024 RPITIT), since bringing it up waits on
//! the network.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, PiccType, ReaderInfo};
use station_core::Uid;

/// Raw result of a successful anticollision + SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCard {
    /// UID bytes as assembled from all cascade levels.
    pub uid: Vec<u8>,

    /// Card family reported by the SAK of the last cascade level.
    pub picc_type: PiccType,
}

impl SelectedCard {
    /// Create a new selected card.
    pub fn new(uid: Vec<u8>, picc_type: PiccType) -> Self {
        Self { uid, picc_type }
    }

    /// Create a selected card from the raw SAK byte.
    pub fn from_sak(uid: Vec<u8>, sak: u8) -> Self {
        Self::new(uid, PiccType::from_sak(sak))
    }
}

/// RFID card data.
///
/// Contains information about a card that was read and accepted by the
/// reader: the unique identifier (UID), the card family and the time of the
/// read.
#[derive(Debug, Clone, PartialEq)]
pub struct CardData {
    /// Card unique identifier (4-10 bytes).
    pub uid: Uid,

    /// Card family derived from the SAK.
    pub picc_type: PiccType,

    /// Timestamp when the card was read.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Create new card data with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is not within the valid range
    /// of 4-10 bytes as specified by ISO 14443.
    ///
    /// # Examples
    ///
    /// ```
    /// use station_hardware::traits::CardData;
    /// use station_hardware::types::PiccType;
    ///
    /// let card = CardData::new(vec![0x04, 0xA1, 0x3B, 0x7E], PiccType::Mifare1K).unwrap();
    /// assert_eq!(card.uid.hex_spaced(), " 04 A1 3B 7E");
    /// ```
    pub fn new(uid: Vec<u8>, picc_type: PiccType) -> Result<Self> {
        CardDataBuilder::new(uid, picc_type).build()
    }

    /// Create a builder for constructing card data with optional fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use station_hardware::traits::CardData;
    /// use station_hardware::types::PiccType;
    /// use chrono::{Utc, TimeZone};
    ///
    /// let when = Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap();
    /// let card = CardData::builder(vec![0x01, 0x02, 0x03, 0x04], PiccType::Mifare1K)
    ///     .timestamp(when)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(card.timestamp, when);
    /// ```
    pub fn builder(uid: Vec<u8>, picc_type: PiccType) -> CardDataBuilder {
        CardDataBuilder::new(uid, picc_type)
    }

    /// Build card data from a raw SELECT result.
    pub fn from_selected(card: SelectedCard) -> Result<Self> {
        CardDataBuilder::new(card.uid, card.picc_type).build()
    }

    /// Whether this card is a MIFARE Classic (Mini, 1K or 4K).
    pub fn is_mifare_classic(&self) -> bool {
        self.picc_type.is_mifare_classic()
    }
}

/// Builder for constructing CardData with optional fields.
#[derive(Debug, Clone)]
pub struct CardDataBuilder {
    uid: Vec<u8>,
    picc_type: PiccType,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl CardDataBuilder {
    /// Create a new CardDataBuilder with required fields.
    pub fn new(uid: Vec<u8>, picc_type: PiccType) -> Self {
        Self {
            uid,
            picc_type,
            timestamp: None,
        }
    }

    /// Set a custom timestamp for the card read event.
    ///
    /// If not set, the current time will be used when build() is called.
    pub fn timestamp(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the CardData instance with validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is not between 4 and 10 bytes.
    pub fn build(self) -> Result<CardData> {
        let uid = Uid::new(self.uid)?;

        Ok(CardData {
            uid,
            picc_type: self.picc_type,
            timestamp: self.timestamp.unwrap_or_else(chrono::Utc::now),
        })
    }
}

/// Card reader chip abstraction (PCD side of ISO 14443-A).
///
/// The operations mirror what the reader chip exposes: a presence check
/// (REQA), anticollision + SELECT, HLTA and stopping the Crypto1 unit.
/// Policy (type filtering, release sequencing) lives in
/// [`CardReader`](crate::reader::CardReader).
///
/// # Examples
///
/// ```no_run
/// use station_hardware::traits::ReaderDevice;
/// use station_hardware::error::Result;
///
/// fn read_uid<R: ReaderDevice>(reader: &mut R) -> Result<Option<Vec<u8>>> {
///     if !reader.is_new_card_present()? {
///         return Ok(None);
///     }
///     let card = reader.read_card_serial()?;
///     Ok(Some(card.uid))
/// }
/// ```
pub trait ReaderDevice: Send {
    /// Reset and configure the chip, turning the antenna on.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not answer on the bus.
    fn init(&mut self) -> Result<ReaderInfo>;

    /// Whether a card in IDLE state answered a REQA.
    ///
    /// # Errors
    ///
    /// Returns an error only on bus failures; "no answer" is `Ok(false)`.
    fn is_new_card_present(&mut self) -> Result<bool>;

    /// Run anticollision and SELECT on the card that answered the last REQA.
    ///
    /// # Errors
    ///
    /// Returns a transient error (see [`HardwareError::is_transient`]) when
    /// the UID could not be retrieved this time.
    ///
    /// [`HardwareError::is_transient`]: crate::error::HardwareError::is_transient
    fn read_card_serial(&mut self) -> Result<SelectedCard>;

    /// Send HLTA to the selected card.
    fn halt(&mut self) -> Result<()>;

    /// Leave the authenticated state (clear `MFCrypto1On`).
    fn stop_crypto(&mut self) -> Result<()>;

    /// Reader information, including the chip version.
    fn reader_info(&mut self) -> Result<ReaderInfo>;
}

/// Text status display.
///
/// `show` clears the panel, draws the text and flushes it in one call.
pub trait StatusDisplay: Send {
    /// Initialise the panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel does not answer.
    fn init(&mut self) -> Result<()>;

    /// Replace the whole screen with `text`.
    fn show(&mut self, text: &str) -> Result<()>;

    /// Static information about the panel.
    fn device_info(&self) -> DeviceInfo;
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for Box<T> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn show(&mut self, text: &str) -> Result<()> {
        (**self).show(text)
    }

    fn device_info(&self) -> DeviceInfo {
        (**self).device_info()
    }
}

/// Network association (Wi-Fi on the device, name resolution on a host).
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. For dynamic dispatch use
/// [`AnyNetworkLink`](crate::devices::AnyNetworkLink).
pub trait NetworkLink: Send {
    /// Make one attempt to bring the link up.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`](crate::error::HardwareError::LinkError) when
    /// the attempt failed; callers retry.
    async fn connect(&mut self) -> Result<()>;

    /// Whether the link is currently up.
    async fn is_connected(&mut self) -> bool;

    /// Static information about the link.
    fn device_info(&self) -> DeviceInfo;
}

//! Card reader policy on top of a [`ReaderDevice`].
//!
//! [`CardReader::poll_for_card`] runs one detection attempt and only hands
//! back MIFARE Classic cards; everything else is logged, halted and
//! discarded. [`CardReader::release`] ends the session with a card so the
//! next poll starts from a clean reader state.

use crate::error::Result;
use crate::traits::{CardData, ReaderDevice};
use crate::types::ReaderInfo;
use station_core::constants::{DEFAULT_MIFARE_KEY, MIFARE_KEY_SIZE};
use tracing::{debug, info, warn};

/// Detection and release of MIFARE Classic cards.
///
/// # Examples
///
/// ```
/// use station_hardware::mock::MockReader;
/// use station_hardware::reader::CardReader;
///
/// let (device, handle) = MockReader::new();
/// let mut reader = CardReader::new(device);
///
/// handle.tap(vec![0x04, 0xA1, 0x3B, 0x7E], 0x08).unwrap();
/// let card = reader.poll_for_card().unwrap().unwrap();
/// assert_eq!(card.uid.hex_spaced(), " 04 A1 3B 7E");
///
/// reader.release().unwrap();
/// assert_eq!(handle.halt_count(), 1);
/// ```
#[derive(Debug)]
pub struct CardReader<D> {
    device: D,
    key: [u8; MIFARE_KEY_SIZE],
}

impl<D: ReaderDevice> CardReader<D> {
    /// Create a reader using the factory default key (six `0xFF` bytes).
    pub fn new(device: D) -> Self {
        Self::with_key(device, DEFAULT_MIFARE_KEY)
    }

    /// Create a reader with an explicit sector key.
    pub fn with_key(device: D, key: [u8; MIFARE_KEY_SIZE]) -> Self {
        Self { device, key }
    }

    /// Initialise the underlying chip.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not respond; the station treats
    /// this as fatal.
    pub fn init(&mut self) -> Result<ReaderInfo> {
        let info = self.device.init()?;
        match info.chip_version {
            Some(version) => info!(reader = %info.name, %version, "Card reader ready"),
            None => info!(reader = %info.name, "Card reader ready"),
        }
        Ok(info)
    }

    /// The sector key kept for MIFARE Classic access.
    pub fn key(&self) -> &[u8; MIFARE_KEY_SIZE] {
        &self.key
    }

    /// Run one detection attempt.
    ///
    /// Returns `Ok(None)` when no card is in the field, when the UID could not
    /// be read this time, or when the card is not a MIFARE Classic. A returned
    /// card is left selected; call [`release`](Self::release) when done.
    ///
    /// # Errors
    ///
    /// Only bus-level failures of the reader are returned as errors.
    pub fn poll_for_card(&mut self) -> Result<Option<CardData>> {
        if !self.device.is_new_card_present()? {
            return Ok(None);
        }

        let selected = match self.device.read_card_serial() {
            Ok(selected) => selected,
            Err(e) if e.is_transient() => {
                debug!(error = %e, "Card serial could not be read");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let card = match CardData::from_selected(selected) {
            Ok(card) => card,
            Err(e) => {
                warn!(error = %e, "Discarding card with invalid UID");
                self.discard();
                return Ok(None);
            }
        };

        if !card.is_mifare_classic() {
            info!(picc_type = %card.picc_type, "Your tag is not of type MIFARE Classic.");
            self.discard();
            return Ok(None);
        }

        Ok(Some(card))
    }

    /// Halt the selected card and leave the Crypto1 state.
    ///
    /// Both steps are always attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if either step failed on the bus.
    pub fn release(&mut self) -> Result<()> {
        let halted = self.device.halt();
        let stopped = self.device.stop_crypto();
        halted.and(stopped)
    }

    /// Reader information, including the chip version.
    pub fn reader_info(&mut self) -> Result<ReaderInfo> {
        self.device.reader_info()
    }

    /// Access the underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Consume the reader, returning the device.
    pub fn into_inner(self) -> D {
        self.device
    }

    fn discard(&mut self) {
        if let Err(e) = self.release() {
            debug!(error = %e, "Release of discarded card failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HardwareError;
    use crate::mock::MockReader;
    use crate::types::PiccType;
    use rstest::rstest;

    #[test]
    fn test_no_card_returns_none() {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        assert!(reader.poll_for_card().unwrap().is_none());
        assert_eq!(handle.halt_count(), 0);
    }

    #[rstest]
    #[case(0x09, PiccType::MifareMini)]
    #[case(0x08, PiccType::Mifare1K)]
    #[case(0x18, PiccType::Mifare4K)]
    fn test_classic_cards_are_returned(#[case] sak: u8, #[case] expected: PiccType) {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        handle.tap(vec![0x04, 0xA1, 0x3B, 0x7E], sak).unwrap();
        let card = reader.poll_for_card().unwrap().unwrap();

        assert_eq!(card.picc_type, expected);
        assert_eq!(handle.halt_count(), 0);
    }

    #[rstest]
    #[case(0x00)]
    #[case(0x10)]
    #[case(0x20)]
    #[case(0x40)]
    fn test_non_classic_cards_are_discarded_and_halted(#[case] sak: u8) {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        handle.tap(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66], sak).unwrap();

        assert!(reader.poll_for_card().unwrap().is_none());
        assert_eq!(handle.halt_count(), 1);
        assert_eq!(handle.stop_crypto_count(), 1);
    }

    #[test]
    fn test_unreadable_serial_returns_none() {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        handle.tap_unreadable().unwrap();

        assert!(reader.poll_for_card().unwrap().is_none());
        assert!(reader.poll_for_card().unwrap().is_none());
    }

    #[test]
    fn test_bus_failure_propagates() {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        handle.fail_next(HardwareError::communication("SPI bus fault"));

        let err = reader.poll_for_card().unwrap_err();
        assert!(matches!(err, HardwareError::CommunicationError { .. }));
    }

    #[test]
    fn test_release_halts_and_stops_crypto() {
        let (device, handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        handle.tap(vec![0x01, 0x02, 0x03, 0x04], 0x08).unwrap();
        reader.poll_for_card().unwrap().unwrap();
        reader.release().unwrap();

        assert_eq!(handle.halt_count(), 1);
        assert_eq!(handle.stop_crypto_count(), 1);
    }

    #[test]
    fn test_default_key() {
        let (device, _handle) = MockReader::new();
        let reader = CardReader::new(device);
        assert_eq!(reader.key(), &[0xFF; 6]);
    }

    #[test]
    fn test_init_reports_reader_info() {
        let (device, _handle) = MockReader::new();
        let mut reader = CardReader::new(device);

        let info = reader.init().unwrap();
        assert_eq!(info.name, "Mock RFID Reader");
    }
}

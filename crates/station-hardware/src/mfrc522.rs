//! MFRC522 contactless reader.
//!
//! [`Mfrc522Reader`] puts the `mfrc522` driver behind [`ReaderDevice`]. The
//! driver does the ISO 14443-A work (REQA, cascaded anticollision + SELECT,
//! HLTA, Crypto1); this module keeps the ATQA between the presence check and
//! the serial read, maps driver errors onto [`HardwareError`] and tracks the
//! chip version.
//!
//! # Examples
//!
//! ```
//! use embedded_hal::spi::SpiDevice;
//! use station_hardware::mfrc522::Mfrc522Reader;
//! use station_hardware::reader::CardReader;
//!
//! fn start<SPI: SpiDevice + Send>(spi: SPI) -> station_hardware::Result<()> {
//!     let mut reader = CardReader::new(Mfrc522Reader::from_spi(spi));
//!     let info = reader.init()?;
//!     println!("{:?}", info.chip_version);
//!     Ok(())
//! }
//! ```

use crate::error::{HardwareError, Result};
use crate::traits::{ReaderDevice, SelectedCard};
use crate::types::{ChipVersion, PiccType, ReaderInfo};
use embedded_hal::spi::SpiDevice;
use mfrc522::comm::Interface;
use mfrc522::comm::blocking::spi::{DummyDelay, SpiInterface};
use mfrc522::{AtqA, Initialized, Mfrc522, Uninitialized};
use std::fmt;
use tracing::{debug, trace};

/// Timeout programmed into the chip timer by the driver (40 kHz, 1000 ticks).
const TIMER_TIMEOUT_MS: u64 = 25;

const DEVICE_NAME: &str = "MFRC522";

/// Cascade tag (CT) opening every cascade level but the last.
const CASCADE_TAG: u8 = 0x88;

enum Chip<COMM: Interface> {
    Uninitialized(Mfrc522<COMM, Uninitialized>),
    Ready(Mfrc522<COMM, Initialized>),
    /// The driver was consumed by a failed initialisation.
    Lost,
}

/// MFRC522 reader implementing [`ReaderDevice`].
pub struct Mfrc522Reader<COMM: Interface> {
    chip: Chip<COMM>,
    /// Answer to the last successful REQA, consumed by the serial read.
    atqa: Option<AtqA>,
    version: Option<ChipVersion>,
}

impl<SPI> Mfrc522Reader<SpiInterface<SPI, DummyDelay>>
where
    SPI: SpiDevice,
{
    /// Reader on an SPI device whose chip select (SS) is driven by the
    /// device itself.
    pub fn from_spi(spi: SPI) -> Self {
        Self::new(Mfrc522::new(SpiInterface::new(spi)))
    }
}

impl<COMM: Interface> Mfrc522Reader<COMM> {
    /// Wrap a driver that has not been initialised yet. Nothing is sent
    /// until [`ReaderDevice::init`].
    pub fn new(chip: Mfrc522<COMM, Uninitialized>) -> Self {
        Self {
            chip: Chip::Uninitialized(chip),
            atqa: None,
            version: None,
        }
    }

    /// Give the bus interface back, unless a failed init consumed it.
    pub fn release(self) -> Option<COMM> {
        match self.chip {
            Chip::Uninitialized(chip) => Some(chip.release()),
            Chip::Ready(chip) => Some(chip.release()),
            Chip::Lost => None,
        }
    }

    fn ready(&mut self) -> Result<&mut Mfrc522<COMM, Initialized>> {
        match &mut self.chip {
            Chip::Ready(chip) => Ok(chip),
            Chip::Uninitialized(_) => Err(HardwareError::initialization_failed(
                "MFRC522 used before init",
            )),
            Chip::Lost => Err(HardwareError::disconnected(DEVICE_NAME)),
        }
    }

    fn info(&self) -> ReaderInfo {
        let info = ReaderInfo::new(DEVICE_NAME, vec!["ISO14443A".to_string()]);
        match self.version {
            Some(version) => info.with_chip_version(version),
            None => info,
        }
    }
}

impl<E, COMM> Mfrc522Reader<COMM>
where
    COMM: Interface<Error = E>,
    E: fmt::Debug,
{
    fn read_version(&mut self) -> Result<ChipVersion> {
        let raw = self.ready()?.version().map_err(chip_error)?;
        let version = ChipVersion::from_register(raw);
        self.version = Some(version);
        Ok(version)
    }
}

impl<COMM: Interface> fmt::Debug for Mfrc522Reader<COMM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.chip {
            Chip::Uninitialized(_) => "uninitialized",
            Chip::Ready(_) => "ready",
            Chip::Lost => "lost",
        };
        f.debug_struct("Mfrc522Reader")
            .field("state", &state)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<E, COMM> ReaderDevice for Mfrc522Reader<COMM>
where
    COMM: Interface<Error = E> + Send,
    E: fmt::Debug,
{
    fn init(&mut self) -> Result<ReaderInfo> {
        let chip = match std::mem::replace(&mut self.chip, Chip::Lost) {
            Chip::Uninitialized(chip) => chip.init().map_err(|e| {
                HardwareError::initialization_failed(format!("MFRC522 reset failed: {e:?}"))
            })?,
            Chip::Ready(chip) => chip,
            Chip::Lost => return Err(HardwareError::disconnected(DEVICE_NAME)),
        };
        self.chip = Chip::Ready(chip);
        self.atqa = None;

        let version = self.read_version()?;
        if !version.is_responding() {
            return Err(HardwareError::initialization_failed(format!(
                "MFRC522 not responding (VersionReg {version})"
            )));
        }
        debug!(%version, "MFRC522 initialised");

        Ok(self.info())
    }

    fn is_new_card_present(&mut self) -> Result<bool> {
        let answer = self.ready()?.new_card_present();
        match answer {
            Ok(atqa) => {
                self.atqa = Some(atqa);
                Ok(true)
            }
            Err(mfrc522::Error::Comm(e)) => Err(bus_error(e)),
            Err(e) => {
                trace!(error = ?e, "No answer to REQA");
                self.atqa = None;
                Ok(false)
            }
        }
    }

    fn read_card_serial(&mut self) -> Result<SelectedCard> {
        let atqa = self
            .atqa
            .take()
            .ok_or_else(|| HardwareError::card_read("no card answered REQA"))?;
        let uid = self.ready()?.select(&atqa).map_err(chip_error)?;
        check_final_level(uid.as_bytes())?;

        let card = SelectedCard::new(uid.as_bytes().to_vec(), PiccType::from(uid.get_type()));
        debug!(uid = ?card.uid, picc_type = %card.picc_type, "Card selected");
        Ok(card)
    }

    fn halt(&mut self) -> Result<()> {
        self.ready()?.hlta().map_err(|e| match e {
            mfrc522::Error::Nak => HardwareError::card_read("card answered HLTA"),
            e => chip_error(e),
        })
    }

    fn stop_crypto(&mut self) -> Result<()> {
        self.ready()?.stop_crypto1().map_err(chip_error)
    }

    fn reader_info(&mut self) -> Result<ReaderInfo> {
        if self.version.is_none() {
            self.read_version()?;
        }
        Ok(self.info())
    }
}

impl From<mfrc522::Type> for PiccType {
    fn from(kind: mfrc522::Type) -> Self {
        match kind {
            mfrc522::Type::NotComplete => Self::NotComplete,
            mfrc522::Type::MifareMini => Self::MifareMini,
            mfrc522::Type::Mifare1k => Self::Mifare1K,
            mfrc522::Type::Mifare4k => Self::Mifare4K,
            mfrc522::Type::MifareUL => Self::MifareUltralight,
            mfrc522::Type::MifarePlus => Self::MifarePlus,
            mfrc522::Type::MifareDesfire => Self::MifareDesfire,
            mfrc522::Type::TNP3XXX => Self::Tnp3xxx,
            mfrc522::Type::Iso14443_4 => Self::Iso14443_4,
            mfrc522::Type::Iso18092 => Self::Iso18092,
            mfrc522::Type::Unknown => Self::Unknown,
        }
    }
}

/// The driver strips cascade tags without looking at them. A complete SAK
/// after a level that opens with CT means the card's SAK and anticollision
/// answer disagree; uid0, uid3 and uid6 may never be CT for the same reason.
fn check_final_level(uid: &[u8]) -> Result<()> {
    let final_level = uid.len().saturating_sub(4);
    if uid.get(final_level) == Some(&CASCADE_TAG) {
        return Err(HardwareError::card_read(format!(
            "cascade tag in final UID level {uid:02X?}"
        )));
    }
    Ok(())
}

fn bus_error<E: fmt::Debug>(e: E) -> HardwareError {
    HardwareError::communication(format!("SPI transfer failed: {e:?}"))
}

/// Bus faults stay fatal; anything the card did wrong is transient.
fn chip_error<E: fmt::Debug>(e: mfrc522::Error<E>) -> HardwareError {
    match e {
        mfrc522::Error::Comm(e) => bus_error(e),
        mfrc522::Error::Timeout => HardwareError::timeout(TIMER_TIMEOUT_MS),
        mfrc522::Error::Collision => HardwareError::Collision,
        e => HardwareError::card_read(format!("{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::spi::{MockMfrc522Chip, crc_a, registers, with_bcc};
    use rstest::rstest;

    const REQA: u8 = 0x26;
    const SEL_CL1: u8 = 0x93;
    const SEL_CL2: u8 = 0x95;

    type Reader = Mfrc522Reader<SpiInterface<MockMfrc522Chip, DummyDelay>>;

    fn ready_reader(chip: MockMfrc522Chip) -> Reader {
        let mut reader = Mfrc522Reader::from_spi(chip);
        reader.init().unwrap();
        reader
    }

    fn into_chip(reader: Reader) -> MockMfrc522Chip {
        reader.release().unwrap().release()
    }

    #[test]
    fn test_init_reads_version_and_enables_antenna() {
        let mut reader = Mfrc522Reader::from_spi(MockMfrc522Chip::new(0x92));

        let info = reader.init().unwrap();
        assert_eq!(info.name, "MFRC522");
        assert_eq!(info.chip_version, Some(ChipVersion::V2_0));

        let chip = into_chip(reader);
        assert_eq!(chip.register(registers::TX_CONTROL) & 0x03, 0x03);
        assert_eq!(chip.register(registers::T_PRESCALER), 0xA9);
    }

    #[rstest]
    #[case(0x00)]
    #[case(0xFF)]
    fn test_init_fails_when_chip_silent(#[case] version: u8) {
        let mut reader = Mfrc522Reader::from_spi(MockMfrc522Chip::new(version));
        let err = reader.init().unwrap_err();
        assert!(matches!(err, HardwareError::InitializationFailed { .. }));
    }

    #[test]
    fn test_operations_before_init_fail() {
        let mut reader = Mfrc522Reader::from_spi(MockMfrc522Chip::new(0x92));
        let err = reader.is_new_card_present().unwrap_err();
        assert!(matches!(err, HardwareError::InitializationFailed { .. }));
    }

    #[test]
    fn test_card_present_sends_short_frame_reqa() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).answer(&[0x04, 0x00]));

        assert!(reader.is_new_card_present().unwrap());

        let chip = into_chip(reader);
        assert_eq!(chip.sent(), &[vec![REQA]]);
        assert_eq!(chip.register(registers::BIT_FRAMING) & 0x07, 7);
    }

    #[test]
    fn test_no_card_when_reqa_times_out() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92));
        assert!(!reader.is_new_card_present().unwrap());
    }

    #[test]
    fn test_select_single_size_uid() {
        let uid = [0x04, 0xA1, 0x3B, 0x7E];
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).with_card(&uid, 0x08));

        assert!(reader.is_new_card_present().unwrap());
        let card = reader.read_card_serial().unwrap();
        assert_eq!(card.uid, uid.to_vec());
        assert_eq!(card.picc_type, PiccType::Mifare1K);

        let chip = into_chip(reader);
        assert_eq!(chip.sent()[1], vec![SEL_CL1, 0x20]);
        let select = &chip.sent()[2];
        assert_eq!(&select[..2], &[SEL_CL1, 0x70]);
        assert_eq!(&select[2..7], with_bcc(uid).as_slice());
        assert_eq!(select[7..], crc_a(&select[..7]));
    }

    #[test]
    fn test_select_double_size_uid() {
        let uid = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).with_card(&uid, 0x00));

        assert!(reader.is_new_card_present().unwrap());
        let card = reader.read_card_serial().unwrap();
        assert_eq!(card.uid, uid.to_vec());
        assert_eq!(card.picc_type, PiccType::MifareUltralight);

        let chip = into_chip(reader);
        assert_eq!(chip.sent()[3], vec![SEL_CL2, 0x20]);
    }

    #[test]
    fn test_select_rejects_bad_sak_crc() {
        let chip = MockMfrc522Chip::new(0x92)
            .answer(&[0x04, 0x00])
            .answer(&with_bcc([0x04, 0xA1, 0x3B, 0x7E]))
            .answer(&[0x08, 0x00, 0x00]);
        let mut reader = ready_reader(chip);

        assert!(reader.is_new_card_present().unwrap());
        let err = reader.read_card_serial().unwrap_err();
        assert!(err.is_transient());
    }

    #[rstest]
    #[case::single(&[0x88, 0x01, 0x02, 0x03], 0x08)]
    #[case::double(&[0x04, 0x11, 0x22, 0x88, 0x44, 0x55, 0x66], 0x00)]
    #[case::triple(&[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x88, 0x77, 0x66, 0x55], 0x00)]
    fn test_cascade_tag_in_final_level_is_rejected(#[case] uid: &[u8], #[case] sak: u8) {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).with_card(uid, sak));

        assert!(reader.is_new_card_present().unwrap());
        let err = reader.read_card_serial().unwrap_err();
        assert!(matches!(err, HardwareError::CardReadError { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_cascade_tag_only_in_leading_levels_is_accepted() {
        let uid = [0x04, 0x88, 0x22, 0x33, 0x44, 0x55, 0x66];
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).with_card(&uid, 0x00));

        assert!(reader.is_new_card_present().unwrap());
        assert_eq!(reader.read_card_serial().unwrap().uid, uid.to_vec());
    }

    #[test]
    fn test_serial_read_without_reqa_is_transient() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92));
        let err = reader.read_card_serial().unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_select_timeout_is_transient() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).answer(&[0x04, 0x00]));

        assert!(reader.is_new_card_present().unwrap());
        let err = reader.read_card_serial().unwrap_err();
        assert!(matches!(err, HardwareError::Timeout { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_halt_succeeds_on_silence() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92));

        reader.halt().unwrap();

        let chip = into_chip(reader);
        assert_eq!(chip.sent(), &[vec![0x50, 0x00, 0x57, 0xCD]]);
    }

    #[test]
    fn test_halt_fails_when_card_answers() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x92).answer(&[0x00]));
        let err = reader.halt().unwrap_err();
        assert!(matches!(err, HardwareError::CardReadError { .. }));
    }

    #[test]
    fn test_stop_crypto_clears_crypto1_bit() {
        let mut chip = MockMfrc522Chip::new(0x92);
        chip.set_register(registers::STATUS2, 0x08 | 0x01);
        let mut reader = ready_reader(chip);

        reader.stop_crypto().unwrap();

        let chip = into_chip(reader);
        assert_eq!(chip.register(registers::STATUS2), 0x01);
    }

    #[test]
    fn test_reader_info_after_init() {
        let mut reader = ready_reader(MockMfrc522Chip::new(0x91));
        let info = reader.reader_info().unwrap();
        assert_eq!(info.chip_version, Some(ChipVersion::V1_0));
    }

    #[rstest]
    #[case(mfrc522::Type::Mifare1k, PiccType::Mifare1K)]
    #[case(mfrc522::Type::Mifare4k, PiccType::Mifare4K)]
    #[case(mfrc522::Type::MifareMini, PiccType::MifareMini)]
    #[case(mfrc522::Type::MifareUL, PiccType::MifareUltralight)]
    #[case(mfrc522::Type::MifareDesfire, PiccType::MifareDesfire)]
    #[case(mfrc522::Type::Iso14443_4, PiccType::Iso14443_4)]
    fn test_driver_type_mapping(#[case] kind: mfrc522::Type, #[case] expected: PiccType) {
        assert_eq!(PiccType::from(kind), expected);
    }
}

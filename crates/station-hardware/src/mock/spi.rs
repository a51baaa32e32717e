//! Register-level MFRC522 model on a mock SPI bus.
//!
//! [`MockMfrc522Chip`] is an `embedded-hal` [`SpiDevice`] that answers the
//! register traffic of the `mfrc522` driver: soft reset, FIFO, the CRC
//! coprocessor and transceive. Card answers are scripted in order; an empty
//! script means no card in the field (the chip timer fires).
//!
//! # Examples
//!
//! ```
//! use station_hardware::mfrc522::Mfrc522Reader;
//! use station_hardware::mock::MockMfrc522Chip;
//! use station_hardware::reader::CardReader;
//!
//! let chip = MockMfrc522Chip::new(0x92).with_card(&[0x04, 0xA1, 0x3B, 0x7E], 0x08);
//! let mut reader = CardReader::new(Mfrc522Reader::from_spi(chip));
//! reader.init().unwrap();
//!
//! let card = reader.poll_for_card().unwrap().unwrap();
//! assert_eq!(station_core::format::hex_compact(card.uid.as_bytes()), "04A13B7E");
//! reader.release().unwrap();
//! assert!(reader.poll_for_card().unwrap().is_none());
//! ```

use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
use std::collections::VecDeque;
use std::convert::Infallible;

/// Register addresses the model gives special treatment.
pub mod registers {
    pub const COMMAND: u8 = 0x01;
    pub const COM_IRQ: u8 = 0x04;
    pub const DIV_IRQ: u8 = 0x05;
    pub const STATUS2: u8 = 0x08;
    pub const FIFO_DATA: u8 = 0x09;
    pub const FIFO_LEVEL: u8 = 0x0A;
    pub const BIT_FRAMING: u8 = 0x0D;
    pub const TX_CONTROL: u8 = 0x14;
    pub const CRC_RESULT_H: u8 = 0x21;
    pub const CRC_RESULT_L: u8 = 0x22;
    pub const T_PRESCALER: u8 = 0x2B;
    pub const VERSION: u8 = 0x37;
}

const CMD_CALC_CRC: u8 = 0x03;
const CMD_TRANSCEIVE: u8 = 0x0C;
const CMD_SOFT_RESET: u8 = 0x0F;

const IRQ_TIMER: u8 = 0x01;
const IRQ_CRC: u8 = 0x04;
const IRQ_IDLE: u8 = 0x10;
const IRQ_RX: u8 = 0x20;

const CASCADE_TAG: u8 = 0x88;
/// SAK bit announcing another cascade level.
const SAK_UID_INCOMPLETE: u8 = 0x04;

/// ISO 14443-3 CRC_A (initial value 0x6363), low byte first.
///
/// ```
/// use station_hardware::mock::spi::crc_a;
///
/// // HLTA frame: 50 00 57 CD
/// assert_eq!(crc_a(&[0x50, 0x00]), [0x57, 0xCD]);
/// ```
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut b = byte ^ (crc & 0x00FF) as u8;
        b ^= b << 4;
        let b = u16::from(b);
        crc = (crc >> 8) ^ (b << 8) ^ (b << 3) ^ (b >> 4);
    }
    crc.to_le_bytes()
}

#[derive(Debug)]
enum Access {
    Read(u8),
    Write(u8),
}

/// Mock MFRC522 behind an SPI device.
#[derive(Debug)]
pub struct MockMfrc522Chip {
    regs: [u8; 0x40],
    fifo: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
    answers: VecDeque<Option<Vec<u8>>>,
}

impl MockMfrc522Chip {
    /// A chip reporting `version` in `VersionReg` (0x92 for a v2.0 part).
    pub fn new(version: u8) -> Self {
        let mut chip = Self {
            regs: [0; 0x40],
            fifo: VecDeque::new(),
            sent: Vec::new(),
            answers: VecDeque::new(),
        };
        chip.regs[registers::VERSION as usize] = version;
        chip
    }

    /// Queue the card's answer to the next transceive.
    pub fn answer(mut self, bytes: &[u8]) -> Self {
        self.answers.push_back(Some(bytes.to_vec()));
        self
    }

    /// Let the next transceive time out.
    pub fn silence(mut self) -> Self {
        self.answers.push_back(None);
        self
    }

    /// Queue a whole card activation: ATQA, then anticollision and SAK for
    /// every cascade level a 4, 7 or 10 byte UID needs.
    pub fn with_card(mut self, uid: &[u8], sak: u8) -> Self {
        let atqa = if uid.len() > 4 { 0x44 } else { 0x04 };
        self = self.answer(&[atqa, 0x00]);

        let mut rest = uid;
        while rest.len() > 4 {
            let part = [CASCADE_TAG, rest[0], rest[1], rest[2]];
            self = self
                .answer(&with_bcc(part))
                .answer(&sak_frame(SAK_UID_INCOMPLETE));
            rest = &rest[3..];
        }

        let mut part = [0u8; 4];
        let len = rest.len().min(4);
        part[..len].copy_from_slice(&rest[..len]);
        self.answer(&with_bcc(part)).answer(&sak_frame(sak))
    }

    /// Frames transmitted to the card, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs[usize::from(reg & 0x3F)]
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.regs[usize::from(reg & 0x3F)] = value;
    }

    /// One byte on the bus: the first is an address, the rest are data
    /// (writes) or the next address (reads).
    fn clock(&mut self, access: &mut Option<Access>, mosi: u8) -> u8 {
        match access {
            None => {
                let reg = (mosi >> 1) & 0x3F;
                *access = Some(if mosi & 0x80 != 0 {
                    Access::Read(reg)
                } else {
                    Access::Write(reg)
                });
                0
            }
            Some(Access::Write(reg)) => {
                let reg = *reg;
                self.write_register(reg, mosi);
                0
            }
            Some(Access::Read(reg)) => {
                let miso = self.read_register(*reg);
                *access = Some(Access::Read((mosi >> 1) & 0x3F));
                miso
            }
        }
    }

    fn read_register(&mut self, reg: u8) -> u8 {
        match reg {
            registers::FIFO_DATA => self.fifo.pop_front().unwrap_or(0),
            registers::FIFO_LEVEL => self.fifo.len() as u8,
            _ => self.regs[reg as usize],
        }
    }

    fn write_register(&mut self, reg: u8, value: u8) {
        match reg {
            registers::FIFO_DATA => self.fifo.push_back(value),
            registers::FIFO_LEVEL if value & 0x80 != 0 => self.fifo.clear(),
            // Bit 7 clear: the written bits are cleared
            registers::COM_IRQ | registers::DIV_IRQ if value & 0x80 == 0 => {
                self.regs[reg as usize] &= !value;
            }
            registers::COMMAND => self.command(value),
            registers::BIT_FRAMING if value & 0x80 != 0 => {
                self.regs[reg as usize] = value & 0x7F;
                if self.regs[registers::COMMAND as usize] & 0x0F == CMD_TRANSCEIVE {
                    self.transceive();
                }
            }
            _ => self.regs[reg as usize] = value,
        }
    }

    fn command(&mut self, value: u8) {
        match value & 0x0F {
            CMD_SOFT_RESET => self.regs[registers::COMMAND as usize] = 0,
            CMD_CALC_CRC => {
                let data: Vec<u8> = self.fifo.drain(..).collect();
                let crc = crc_a(&data);
                self.regs[registers::CRC_RESULT_L as usize] = crc[0];
                self.regs[registers::CRC_RESULT_H as usize] = crc[1];
                self.regs[registers::DIV_IRQ as usize] |= IRQ_CRC;
                self.regs[registers::COMMAND as usize] = value;
            }
            _ => self.regs[registers::COMMAND as usize] = value,
        }
    }

    fn transceive(&mut self) {
        self.sent.push(self.fifo.drain(..).collect());
        match self.answers.pop_front().flatten() {
            Some(bytes) => {
                self.fifo.extend(bytes);
                self.regs[registers::COM_IRQ as usize] |= IRQ_RX | IRQ_IDLE;
            }
            None => self.regs[registers::COM_IRQ as usize] |= IRQ_TIMER,
        }
    }
}

impl ErrorType for MockMfrc522Chip {
    type Error = Infallible;
}

impl SpiDevice for MockMfrc522Chip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut access = None;
        for op in operations {
            match op {
                Operation::Write(buf) => {
                    for &byte in buf.iter() {
                        self.clock(&mut access, byte);
                    }
                }
                Operation::TransferInPlace(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.clock(&mut access, *byte);
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.clock(&mut access, 0);
                    }
                }
                Operation::Transfer(read, write) => {
                    for (i, &mosi) in write.iter().enumerate() {
                        let miso = self.clock(&mut access, mosi);
                        if let Some(slot) = read.get_mut(i) {
                            *slot = miso;
                        }
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

/// Four UID bytes followed by their BCC.
pub fn with_bcc(part: [u8; 4]) -> Vec<u8> {
    let bcc = part.iter().fold(0u8, |acc, b| acc ^ b);
    let mut bytes = part.to_vec();
    bytes.push(bcc);
    bytes
}

/// SAK byte followed by its CRC_A.
pub fn sak_frame(sak: u8) -> Vec<u8> {
    let crc = crc_a(&[sak]);
    vec![sak, crc[0], crc[1]]
}

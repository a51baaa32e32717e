//! Mock card reader implementation for testing and development.
//!
//! Cards are either *tapped* (answer one REQA, like a card swiped through
//! the field) or *placed* (answer every REQA until removed, like a card
//! resting on the reader).

use crate::error::{HardwareError, Result};
use crate::traits::{ReaderDevice, SelectedCard};
use crate::types::{ChipVersion, ReaderInfo};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Mock card reader.
///
/// # Examples
///
/// ```
/// use station_hardware::mock::MockReader;
/// use station_hardware::traits::ReaderDevice;
///
/// let (mut reader, handle) = MockReader::new();
///
/// handle.tap(vec![0x04, 0xA1, 0x3B, 0x7E], 0x08).unwrap();
///
/// assert!(reader.is_new_card_present().unwrap());
/// let card = reader.read_card_serial().unwrap();
/// assert_eq!(card.uid, vec![0x04, 0xA1, 0x3B, 0x7E]);
/// assert!(!reader.is_new_card_present().unwrap());
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for card events
    event_rx: mpsc::Receiver<CardEvent>,

    /// Card that answered the last REQA and awaits SELECT
    pending: Option<CardEvent>,

    /// State shared with the handle
    state: Arc<Mutex<MockReaderState>>,

    /// Device name
    name: String,
}

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum CardEvent {
    Tap(SelectedCard),
    Unreadable,
}

#[derive(Debug, Default)]
struct MockReaderState {
    resting: Option<SelectedCard>,
    fail_next: Option<HardwareError>,
    halts: usize,
    stop_cryptos: usize,
    polls: usize,
}

fn lock(state: &Mutex<MockReaderState>) -> MutexGuard<'_, MockReaderState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockReader {
    /// Create a new mock reader with the default name.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// can be used to simulate card presentations.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock RFID Reader")
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let state = Arc::new(Mutex::new(MockReaderState::default()));

        let reader = Self {
            event_rx,
            pending: None,
            state: Arc::clone(&state),
            name: name.into(),
        };

        let handle = MockReaderHandle { event_tx, state };

        (reader, handle)
    }

    fn info(&self) -> ReaderInfo {
        ReaderInfo::new(self.name.clone(), vec!["ISO14443A".to_string()])
            .with_chip_version(ChipVersion::V2_0)
    }
}

impl ReaderDevice for MockReader {
    fn init(&mut self) -> Result<ReaderInfo> {
        if let Some(e) = lock(&self.state).fail_next.take() {
            return Err(e);
        }
        Ok(self.info())
    }

    fn is_new_card_present(&mut self) -> Result<bool> {
        let mut state = lock(&self.state);
        state.polls += 1;

        if let Some(e) = state.fail_next.take() {
            return Err(e);
        }
        if self.pending.is_some() {
            return Ok(true);
        }
        if let Ok(event) = self.event_rx.try_recv() {
            self.pending = Some(event);
            return Ok(true);
        }
        if let Some(card) = state.resting.clone() {
            self.pending = Some(CardEvent::Tap(card));
            return Ok(true);
        }
        Ok(false)
    }

    fn read_card_serial(&mut self) -> Result<SelectedCard> {
        match self.pending.take() {
            Some(CardEvent::Tap(card)) => Ok(card),
            Some(CardEvent::Unreadable) => Err(HardwareError::card_read("BCC mismatch at level 1")),
            None => Err(HardwareError::timeout(25)),
        }
    }

    fn halt(&mut self) -> Result<()> {
        lock(&self.state).halts += 1;
        Ok(())
    }

    fn stop_crypto(&mut self) -> Result<()> {
        lock(&self.state).stop_cryptos += 1;
        Ok(())
    }

    fn reader_info(&mut self) -> Result<ReaderInfo> {
        Ok(self.info())
    }
}

/// Handle for controlling a mock reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    /// Channel sender for card events
    event_tx: mpsc::Sender<CardEvent>,

    state: Arc<Mutex<MockReaderState>>,
}

impl MockReaderHandle {
    /// Tap a card: it answers exactly one presence check.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped or too many taps are
    /// queued.
    pub fn tap(&self, uid: Vec<u8>, sak: u8) -> Result<()> {
        self.send(CardEvent::Tap(SelectedCard::from_sak(uid, sak)))
    }

    /// Tap a card whose UID cannot be read (anticollision fails).
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub fn tap_unreadable(&self) -> Result<()> {
        self.send(CardEvent::Unreadable)
    }

    /// Place a card on the reader: it answers every presence check until
    /// [`remove`](Self::remove) is called.
    pub fn place(&self, uid: Vec<u8>, sak: u8) {
        lock(&self.state).resting = Some(SelectedCard::from_sak(uid, sak));
    }

    /// Remove the resting card from the field.
    pub fn remove(&self) {
        lock(&self.state).resting = None;
    }

    /// Make the next reader operation fail with `error`.
    pub fn fail_next(&self, error: HardwareError) {
        lock(&self.state).fail_next = Some(error);
    }

    /// Number of HLTA commands sent.
    pub fn halt_count(&self) -> usize {
        lock(&self.state).halts
    }

    /// Number of times the Crypto1 state was left.
    pub fn stop_crypto_count(&self) -> usize {
        lock(&self.state).stop_cryptos
    }

    /// Number of presence checks performed.
    pub fn poll_count(&self) -> usize {
        lock(&self.state).polls
    }

    fn send(&self, event: CardEvent) -> Result<()> {
        self.event_tx
            .try_send(event)
            .map_err(|_| HardwareError::disconnected("Mock reader event channel closed"))
    }
}

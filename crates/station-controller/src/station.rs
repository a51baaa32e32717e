//! The polling loop.
//!
//! A [`Station`] owns every peripheral and all loop state. [`Station::start`]
//! runs the start-up sequence once; [`Station::poll_once`] performs one
//! detect/classify/report/release cycle; [`Station::run_until`] repeats it
//! until a shutdown future completes.

use crate::error::Result;
use crate::filter::{Classification, DuplicateFilter};
use crate::state_machine::{PollState, PollStateMachine};
use serde::Serialize;
use station_core::constants::{
    LINK_RETRY_INTERVAL_MS, MSG_CONNECTED, MSG_CONNECTING, MSG_SCANNING,
};
use station_core::format::hex_spaced;
use station_core::{LookupResult, StationConfig, Uid};
use station_hardware::reader::CardReader;
use station_hardware::traits::{CardData, NetworkLink, ReaderDevice, StatusDisplay};
use station_network::{ReportClient, Transport};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

/// Link attempts between two progress log lines while associating.
const LINK_PROGRESS_EVERY: usize = 10;

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No MIFARE Classic card was selected.
    NoCard,
    /// A card was read, reported and released.
    Reported(CardReport),
}

impl PollOutcome {
    pub fn report(&self) -> Option<&CardReport> {
        match self {
            Self::NoCard => None,
            Self::Reported(report) => Some(report),
        }
    }
}

/// What happened to one card read.
#[derive(Debug, Clone, PartialEq)]
pub struct CardReport {
    pub card: CardData,
    pub classification: Classification,
    pub result: LookupResult,
}

/// Counters kept over the life of a station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub polls: u64,
    pub cards_read: u64,
    pub repeats: u64,
    pub successes: u64,
    pub not_found: u64,
    pub transport_errors: u64,
    pub link_down_skips: u64,
}

/// RFID attendance station.
///
/// # Examples
///
/// ```
/// use station_controller::{NoDisplay, Station};
/// use station_core::{LookupResult, StationConfig};
/// use station_hardware::mock::{MockLink, MockReader};
/// use station_hardware::reader::CardReader;
/// use station_network::{HttpResponse, ReportClient, Transport, TransportError};
///
/// struct Accepting;
///
/// impl Transport for Accepting {
///     async fn post_json(&self, _url: &str, _body: &str) -> Result<HttpResponse, TransportError> {
///         Ok(HttpResponse::new(201, r#"{"insertData":{"studentId":"SE150001"}}"#))
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (device, reader) = MockReader::new();
///     let (link, _) = MockLink::new();
///     let config = StationConfig::default();
///     let client = ReportClient::new(Accepting, config.uid_format);
///
///     let mut station = Station::new(config, CardReader::new(device), client, NoDisplay, link);
///     station.start().await.unwrap();
///
///     reader.tap(vec![0x04, 0xA1, 0x3B, 0x7E], 0x08).unwrap();
///     let outcome = station.poll_once().await.unwrap();
///     assert_eq!(
///         outcome.report().map(|r| r.result.clone()),
///         Some(LookupResult::Success { display: Some("SE150001".into()) })
///     );
/// }
/// ```
pub struct Station<R, T, D, L> {
    config: StationConfig,
    reader: CardReader<R>,
    client: ReportClient<T>,
    display: D,
    link: L,
    filter: DuplicateFilter,
    machine: PollStateMachine,
    /// When the result on screen gives way to "Scanning" again.
    restore_at: Option<Instant>,
    stats: StationStats,
}

impl<R, T, D, L> Station<R, T, D, L>
where
    R: ReaderDevice,
    T: Transport,
    D: StatusDisplay,
    L: NetworkLink,
{
    pub fn new(
        config: StationConfig,
        reader: CardReader<R>,
        client: ReportClient<T>,
        display: D,
        link: L,
    ) -> Self {
        Self {
            config,
            reader,
            client,
            display,
            link,
            filter: DuplicateFilter::new(),
            machine: PollStateMachine::new(),
            restore_at: None,
            stats: StationStats::default(),
        }
    }

    /// Run the start-up sequence.
    ///
    /// Display and reader are initialised first; then the network link is
    /// brought up, retrying every 100 ms until it succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the display or the reader cannot be
    /// initialised. The station must not poll after that.
    pub async fn start(&mut self) -> Result<()> {
        let display_info = self.display.device_info();
        self.display.init().inspect_err(|e| {
            error!(display = %display_info.name, error = %e, "Display initialisation failed");
        })?;

        let reader = self.reader.init().inspect_err(|e| {
            error!(error = %e, "Card reader initialisation failed");
        })?;
        info!(reader = %reader.name, "This code scan the MIFARE Classic NUID.");

        self.show(MSG_CONNECTING);
        self.connect_link().await;
        self.show(MSG_CONNECTED);

        info!(key = %hex_spaced(self.reader.key()), "Using the following key:");
        self.show(MSG_SCANNING);
        Ok(())
    }

    /// One detect, classify, report and release cycle.
    ///
    /// # Errors
    ///
    /// Only reader bus failures are returned; report failures end up in the
    /// returned [`LookupResult`].
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        self.stats.polls += 1;
        self.restore_if_due();

        let Some(card) = self.reader.poll_for_card()? else {
            return Ok(PollOutcome::NoCard);
        };
        self.machine.transition_to(PollState::CardPresent)?;
        self.stats.cards_read += 1;

        info!(picc_type = %card.picc_type, "PICC type");
        let classification = self.filter.classify(&card.uid);
        match classification {
            Classification::New => info!("A new card has been detected."),
            Classification::SameAsLast => {
                self.stats.repeats += 1;
                info!("Card read previously.");
            }
        }
        info!(
            hex = %card.uid.hex_spaced(),
            dec = %card.uid.decimal_spaced(),
            "The NUID tag is:"
        );

        let result = self.report(&card.uid).await;
        self.notify(&result);

        if let Err(e) = self.reader.release() {
            warn!(error = %e, "Card release failed");
        }
        self.machine.transition_to(PollState::Idle)?;

        Ok(PollOutcome::Reported(CardReport {
            card,
            classification,
            result,
        }))
    }

    /// Poll every `poll_interval` until `shutdown` completes.
    ///
    /// Reader failures are logged and polling continues.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let interval = self.config.poll_interval();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(
                        polls = self.stats.polls,
                        cards = self.stats.cards_read,
                        "Station stopping"
                    );
                    return;
                }
                () = sleep(interval) => {
                    if let Err(e) = self.poll_once().await {
                        error!(error = %e, "Poll failed");
                    }
                }
            }
        }
    }

    /// Start, then poll until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns the start-up error; polling itself never fails.
    pub async fn run<F>(mut self, shutdown: F) -> Result<StationStats>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        self.run_until(shutdown).await;
        Ok(self.stats)
    }

    pub fn stats(&self) -> StationStats {
        self.stats
    }

    pub fn state(&self) -> PollState {
        *self.machine.current_state()
    }

    pub fn state_machine(&self) -> &PollStateMachine {
        &self.machine
    }

    pub fn filter(&self) -> &DuplicateFilter {
        &self.filter
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    async fn connect_link(&mut self) {
        let link = self.link.device_info();
        info!(ssid = %self.config.wifi.ssid, link = %link.name, "Connecting to network");

        let retry = Duration::from_millis(LINK_RETRY_INTERVAL_MS);
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            match self.link.connect().await {
                Ok(()) => break,
                Err(e) => {
                    if attempts % LINK_PROGRESS_EVERY == 0 {
                        info!(attempts, error = %e, "Still connecting");
                    } else {
                        debug!(attempts, error = %e, ".");
                    }
                    sleep(retry).await;
                }
            }
        }
        info!(attempts, "Network connected");
    }

    async fn report(&mut self, uid: &Uid) -> LookupResult {
        if !self.link.is_connected().await {
            warn!(uid = %uid.hex_spaced(), "Network link down, report skipped");
            self.stats.link_down_skips += 1;
            self.stats.transport_errors += 1;
            return LookupResult::TransportError;
        }

        let result = self.client.report(uid, &self.config.endpoints).await;
        match &result {
            LookupResult::Success { .. } => self.stats.successes += 1,
            LookupResult::NotFound => self.stats.not_found += 1,
            LookupResult::TransportError => self.stats.transport_errors += 1,
        }
        result
    }

    fn notify(&mut self, result: &LookupResult) {
        let Some(text) = result.display_text() else {
            return;
        };
        self.show(text);
        self.restore_at = Some(Instant::now() + self.config.display_hold());
    }

    fn restore_if_due(&mut self) {
        if let Some(at) = self.restore_at
            && Instant::now() >= at
        {
            self.restore_at = None;
            self.show(MSG_SCANNING);
        }
    }

    /// Display failures after start-up are logged, never fatal.
    fn show(&mut self, text: &str) {
        if let Err(e) = self.display.show(text) {
            warn!(text, error = %e, "Display update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StationError;
    use rstest::rstest;
    use station_core::EndpointConfig;
    use station_hardware::mock::{
        MockDisplay, MockDisplayHandle, MockLink, MockLinkHandle, MockMfrc522Chip, MockReader,
        MockReaderHandle,
    };
    use station_hardware::{HardwareError, Mfrc522Reader};
    use station_network::{HttpResponse, TransportError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const CARD_A: [u8; 4] = [0x04, 0xA1, 0x3B, 0x7E];
    const CARD_B: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

    /// Answers from a script (falling back to a plain 200) and records every request.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        answers: Arc<Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>>,
        requests: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingTransport {
        fn answering(answers: Vec<std::result::Result<HttpResponse, TransportError>>) -> Self {
            Self {
                answers: Arc::new(Mutex::new(answers.into())),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn post_json(
            &self,
            url: &str,
            body: &str,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.to_string()));
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        }
    }

    struct Rig {
        station: Station<MockReader, RecordingTransport, MockDisplay, MockLink>,
        reader: MockReaderHandle,
        display: MockDisplayHandle,
        link: MockLinkHandle,
        transport: RecordingTransport,
    }

    fn rig_with(config: StationConfig, transport: RecordingTransport, link_failures: usize) -> Rig {
        let (device, reader) = MockReader::new();
        let (display_device, display) = MockDisplay::new();
        let (link_device, link) = MockLink::failing_attempts(link_failures);
        let client = ReportClient::new(transport.clone(), config.uid_format);
        Rig {
            station: Station::new(
                config,
                CardReader::new(device),
                client,
                display_device,
                link_device,
            ),
            reader,
            display,
            link,
            transport,
        }
    }

    fn rig() -> Rig {
        rig_with(StationConfig::default(), RecordingTransport::default(), 0)
    }

    async fn started() -> Rig {
        let mut rig = rig();
        rig.station.start().await.unwrap();
        rig
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_sequence() {
        let mut rig = rig_with(StationConfig::default(), RecordingTransport::default(), 3);
        rig.station.start().await.unwrap();

        assert!(rig.display.is_initialised());
        assert_eq!(rig.display.frames(), vec!["connecting", "connected!", "Scanning"]);
        assert_eq!(rig.link.attempts(), 4);
        assert_eq!(rig.station.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_retry_interval() {
        let mut rig = rig_with(StationConfig::default(), RecordingTransport::default(), 5);
        let started_at = Instant::now();
        rig.station.start().await.unwrap();

        let elapsed = started_at.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_poll_cycle_over_mfrc522_driver() {
        let chip = MockMfrc522Chip::new(0x92).with_card(&CARD_A, 0x08);
        let (display, _) = MockDisplay::new();
        let (link, _) = MockLink::new();
        let transport = RecordingTransport::default();
        let config = StationConfig::default();
        let client = ReportClient::new(transport.clone(), config.uid_format);
        let mut station = Station::new(
            config,
            CardReader::new(Mfrc522Reader::from_spi(chip)),
            client,
            display,
            link,
        );
        station.start().await.unwrap();

        let outcome = station.poll_once().await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.card.uid.as_bytes(), &CARD_A);
        assert_eq!(report.classification, Classification::New);
        assert_eq!(transport.requests()[0].1, r#"{"uid":" 04 A1 3B 7E"}"#);

        // The card was halted, so the next REQA goes unanswered.
        assert_eq!(station.poll_once().await.unwrap(), PollOutcome::NoCard);
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(station.stats().cards_read, 1);
    }

    #[tokio::test]
    async fn test_display_init_failure_is_fatal() {
        let (device, reader) = MockReader::new();
        let (display, _) = MockDisplay::failing();
        let (link, link_handle) = MockLink::new();
        let client = ReportClient::new(RecordingTransport::default(), Default::default());
        let mut station = Station::new(
            StationConfig::default(),
            CardReader::new(device),
            client,
            display,
            link,
        );

        let err = station.start().await.unwrap_err();
        assert!(err.is_initialization_failure());
        assert_eq!(link_handle.attempts(), 0);
        assert_eq!(reader.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_no_card_does_nothing() {
        let mut rig = started().await;

        let outcome = rig.station.poll_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::NoCard);
        assert!(rig.transport.requests().is_empty());
        assert_eq!(rig.station.stats().polls, 1);
        assert!(rig.station.state_machine().history().is_empty());
    }

    #[tokio::test]
    async fn test_same_card_twice_is_reported_twice() {
        let mut rig = started().await;
        rig.reader.place(CARD_A.to_vec(), 0x08);

        let first = rig.station.poll_once().await.unwrap();
        let second = rig.station.poll_once().await.unwrap();

        assert_eq!(first.report().unwrap().classification, Classification::New);
        assert_eq!(second.report().unwrap().classification, Classification::SameAsLast);

        let requests = rig.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].1, r#"{"uid":" 04 A1 3B 7E"}"#);
        assert_eq!(rig.station.stats().repeats, 1);
    }

    #[tokio::test]
    async fn test_different_card_is_new_and_remembered() {
        let mut rig = started().await;

        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();
        rig.station.poll_once().await.unwrap();
        rig.reader.tap(CARD_B.to_vec(), 0x08).unwrap();
        let outcome = rig.station.poll_once().await.unwrap();

        assert_eq!(outcome.report().unwrap().classification, Classification::New);
        assert_eq!(rig.station.filter().last_seen().as_bytes(), &CARD_B);
        assert_eq!(rig.transport.requests()[1].1, r#"{"uid":" DE AD BE EF"}"#);
    }

    #[rstest]
    #[case(0x00)]
    #[case(0x20)]
    #[case(0x40)]
    #[tokio::test]
    async fn test_non_classic_card_is_never_reported(#[case] sak: u8) {
        let mut rig = started().await;
        rig.reader.tap(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66], sak).unwrap();

        let outcome = rig.station.poll_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::NoCard);
        assert!(rig.transport.requests().is_empty());
        assert_eq!(rig.reader.halt_count(), 1);
    }

    #[tokio::test]
    async fn test_card_is_released_and_state_returns_idle() {
        let mut rig = started().await;
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        rig.station.poll_once().await.unwrap();

        assert_eq!(rig.reader.halt_count(), 1);
        assert_eq!(rig.reader.stop_crypto_count(), 1);
        assert_eq!(rig.station.state(), PollState::Idle);
        let history = rig.station.state_machine().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, PollState::CardPresent);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_polling() {
        let transport = RecordingTransport::answering(vec![Err(TransportError::Request(
            "connection refused".into(),
        ))]);
        let mut rig = rig_with(StationConfig::default(), transport, 0);
        rig.station.start().await.unwrap();

        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();
        let outcome = rig.station.poll_once().await.unwrap();
        assert_eq!(outcome.report().unwrap().result, LookupResult::TransportError);
        assert_eq!(rig.station.state(), PollState::Idle);
        assert_eq!(rig.display.last().as_deref(), Some("Scanning"));

        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();
        let outcome = rig.station.poll_once().await.unwrap();
        assert!(outcome.report().unwrap().result.is_success());
        assert_eq!(rig.station.stats().transport_errors, 1);
    }

    #[tokio::test]
    async fn test_link_down_skips_report() {
        let mut rig = started().await;
        rig.link.set_up(false);
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        let outcome = rig.station.poll_once().await.unwrap();

        assert_eq!(outcome.report().unwrap().result, LookupResult::TransportError);
        assert!(rig.transport.requests().is_empty());
        assert_eq!(rig.station.stats().link_down_skips, 1);
        assert_eq!(rig.reader.halt_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_registers_unknown_card() {
        let config = StationConfig::builder()
            .endpoints(EndpointConfig::check_then_register())
            .build()
            .unwrap();
        let transport = RecordingTransport::answering(vec![
            Ok(HttpResponse::new(200, r#"{"message":"Not found"}"#)),
            Ok(HttpResponse::new(201, r#"{"insertData":{"studentId":"SE150001"}}"#)),
        ]);
        let mut rig = rig_with(config, transport, 0);
        rig.station.start().await.unwrap();
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        let outcome = rig.station.poll_once().await.unwrap();

        let requests = rig.transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].0.ends_with("/api/bikeParking"));
        assert!(requests[1].0.ends_with("/api/updateRFID"));
        assert_eq!(requests[0].1, requests[1].1);
        assert_eq!(
            outcome.report().unwrap().result,
            LookupResult::Success {
                display: Some("SE150001".into())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_is_held_then_scanning_returns() {
        let transport = RecordingTransport::answering(vec![Ok(HttpResponse::new(
            200,
            r#"{"insertData":{"studentId":"SE150001"}}"#,
        ))]);
        let mut rig = rig_with(StationConfig::default(), transport, 0);
        rig.station.start().await.unwrap();
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        rig.station.poll_once().await.unwrap();
        assert_eq!(rig.display.last().as_deref(), Some("SE150001"));

        tokio::time::advance(Duration::from_millis(1_000)).await;
        rig.station.poll_once().await.unwrap();
        assert_eq!(rig.display.last().as_deref(), Some("SE150001"));

        tokio::time::advance(Duration::from_millis(600)).await;
        rig.station.poll_once().await.unwrap();
        assert_eq!(rig.display.last().as_deref(), Some("Scanning"));
    }

    #[tokio::test]
    async fn test_not_found_blanks_display() {
        let transport = RecordingTransport::answering(vec![Ok(HttpResponse::new(
            200,
            r#"{"message":"Not found"}"#,
        ))]);
        let mut rig = rig_with(StationConfig::default(), transport, 0);
        rig.station.start().await.unwrap();
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        let outcome = rig.station.poll_once().await.unwrap();

        assert_eq!(outcome.report().unwrap().result, LookupResult::NotFound);
        assert_eq!(rig.display.last().as_deref(), Some(""));
        assert_eq!(rig.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_reader_bus_failure_is_returned() {
        let mut rig = started().await;
        rig.reader.fail_next(HardwareError::communication("SPI bus fault"));

        let err = rig.station.poll_once().await.unwrap_err();

        assert!(matches!(err, StationError::Hardware(_)));
        assert_eq!(rig.station.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stops_on_shutdown() {
        let mut rig = started().await;
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        rig.station
            .run_until(sleep(Duration::from_millis(100)))
            .await;

        assert_eq!(rig.transport.requests().len(), 1);
        assert!(rig.station.stats().polls >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_keeps_polling_after_bus_failure() {
        let mut rig = started().await;
        rig.reader.fail_next(HardwareError::communication("SPI bus fault"));
        rig.reader.tap(CARD_A.to_vec(), 0x08).unwrap();

        rig.station
            .run_until(sleep(Duration::from_millis(200)))
            .await;

        assert_eq!(rig.station.stats().cards_read, 1);
        assert_eq!(rig.transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_stats() {
        let rig = rig();
        rig.reader.place(CARD_A.to_vec(), 0x08);

        let stats = rig
            .station
            .run(sleep(Duration::from_millis(60)))
            .await
            .unwrap();

        assert_eq!(stats.cards_read, 2);
        assert_eq!(stats.repeats, 1);
        assert_eq!(stats.successes, 2);
    }
}

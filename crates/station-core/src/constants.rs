//! Station-wide constants.
//!
//! This module collects the fixed values shared by the reader, the report
//! client and the polling loop: UID bounds, the MIFARE Classic default key,
//! the HTTP status codes treated as success, the report endpoints and the
//! messages shown on the status display.
//!
//! # Usage
//!
//! ```
//! use station_core::constants::*;
//!
//! assert_eq!(DEFAULT_MIFARE_KEY, [0xFF; MIFARE_KEY_SIZE]);
//! assert!(SUCCESS_STATUS_CODES.contains(&201));
//!
//! fn uid_len_ok(len: usize) -> bool {
//!     (MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len)
//! }
//! assert!(uid_len_ok(4));
//! assert!(!uid_len_ok(11));
//! ```

// ============================================================================
// Card Identity
// ============================================================================

/// Minimum UID length in bytes (single size UID, ISO 14443-3).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (triple size UID, ISO 14443-3).
pub const MAX_UID_LENGTH: usize = 10;

/// Length of a MIFARE Classic sector key.
pub const MIFARE_KEY_SIZE: usize = 6;

/// Factory default MIFARE Classic key (key A and key B).
///
/// The station never rotates or customises sector keys.
pub const DEFAULT_MIFARE_KEY: [u8; MIFARE_KEY_SIZE] = [0xFF; MIFARE_KEY_SIZE];

// ============================================================================
// Reporting
// ============================================================================

/// HTTP status codes accepted as a completed report.
pub const SUCCESS_STATUS_CODES: [u16; 2] = [200, 201];

/// Value of the `message` field a lookup endpoint returns for unknown UIDs.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Single-endpoint attendance logging.
pub const ATTENDANCE_URL: &str = "https://rfid-server.vercel.app/attendance/student";

/// Lookup endpoint of the check-then-register variant.
pub const CHECK_URL: &str = "https://rfid-next-kappa.vercel.app/api/bikeParking";

/// Registration endpoint tried when [`CHECK_URL`] answers "Not found".
pub const REGISTER_URL: &str = "https://rfid-next-kappa.vercel.app/api/updateRFID";

/// Upper bound for one POST, including connect and TLS handshake.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Hardware Defaults
// ============================================================================

/// MFRC522 chip select (SDA/SS) GPIO.
pub const DEFAULT_SS_PIN: u8 = 21;

/// MFRC522 reset GPIO.
pub const DEFAULT_RST_PIN: u8 = 2;

/// SPI clock used for the MFRC522.
pub const DEFAULT_SPI_BAUDRATE: u32 = 1_000_000;

// ============================================================================
// Polling Loop
// ============================================================================

/// Pause between two idle polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 25;

/// Delay between two network link checks while associating.
pub const LINK_RETRY_INTERVAL_MS: u64 = 100;

/// Time a lookup result stays on the display before "Scanning" returns.
pub const DEFAULT_DISPLAY_HOLD_MS: u64 = 1_500;

// ============================================================================
// Display Messages
// ============================================================================

/// Shown while the network link comes up.
pub const MSG_CONNECTING: &str = "connecting";

/// Shown once the network link is up.
pub const MSG_CONNECTED: &str = "connected!";

/// Shown while waiting for a card.
pub const MSG_SCANNING: &str = "Scanning";

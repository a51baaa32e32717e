//! Card taps typed on stdin, for running the station without an MFRC522.
//!
//! Each line is one command:
//!
//! - `04A13B7E` or `04 A1 3B 7E, 18`: tap a card (SAK after the comma,
//!   defaults to `08`, a 1K)
//! - `place <uid>[, sak]`: leave a card on the reader
//! - `remove`: take the resting card away

use station_core::format::parse_hex;
use station_hardware::mock::MockReaderHandle;
use std::num::ParseIntError;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// SAK of a MIFARE Classic 1K.
const DEFAULT_SAK: u8 = 0x08;

/// One parsed stdin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCommand {
    Tap { uid: Vec<u8>, sak: u8 },
    Place { uid: Vec<u8>, sak: u8 },
    Remove,
}

/// Why a stdin line was not a card command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("place needs a UID")]
    MissingUid,

    #[error("bad SAK '{input}': {source}")]
    InvalidSak {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error(transparent)]
    InvalidUid(#[from] station_core::Error),
}

/// Parse one input line; `Ok(None)` for blank lines and `#` comments.
pub fn parse_command(line: &str) -> Result<Option<CardCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (place, rest) = match line.split_once(char::is_whitespace) {
        Some(("place", rest)) => (true, rest.trim()),
        _ if line == "place" => return Err(CommandError::MissingUid),
        _ if line == "remove" => return Ok(Some(CardCommand::Remove)),
        _ => (false, line),
    };

    let (uid, sak) = parse_card(rest)?;
    Ok(Some(if place {
        CardCommand::Place { uid, sak }
    } else {
        CardCommand::Tap { uid, sak }
    }))
}

/// Split `<uid>[, sak]`.
fn parse_card(text: &str) -> Result<(Vec<u8>, u8), CommandError> {
    let (uid, sak) = match text.split_once(',') {
        Some((uid, sak)) => {
            let sak = sak.trim();
            let sak = u8::from_str_radix(sak, 16).map_err(|source| CommandError::InvalidSak {
                input: sak.to_string(),
                source,
            })?;
            (uid, sak)
        }
        None => (text, DEFAULT_SAK),
    };
    Ok((parse_hex(uid)?, sak))
}

/// Feed stdin commands into the emulated reader until stdin closes.
pub async fn feed_stdin(handle: MockReaderHandle) {
    info!("Emulated reader: type a UID in hex, optionally followed by `, <SAK>`");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!(%line, error = %e, "Ignoring input");
                continue;
            }
        };

        let sent = match command {
            CardCommand::Tap { uid, sak } => handle.tap(uid, sak),
            CardCommand::Place { uid, sak } => {
                handle.place(uid, sak);
                Ok(())
            }
            CardCommand::Remove => {
                handle.remove();
                Ok(())
            }
        };
        if let Err(e) = sent {
            warn!(error = %e, "Card event dropped");
        }
    }

    info!("stdin closed; no more emulated cards");
}

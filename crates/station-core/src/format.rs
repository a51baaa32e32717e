//! Text renderings of UID bytes.
//!
//! Two console renderings mirror the reader's diagnostic output: hexadecimal
//! and decimal, each byte preceded by a single space. The hexadecimal
//! rendering is also the transport form of a UID unless [`UidFormat::Compact`]
//! is selected.
//!
//! ```
//! use station_core::format::{decimal_spaced, hex_spaced, parse_hex};
//!
//! let uid = [0x04, 0xA1, 0x3B, 0x7E];
//! assert_eq!(hex_spaced(&uid), " 04 A1 3B 7E");
//! assert_eq!(decimal_spaced(&uid), " 4 161 59 126");
//! assert_eq!(parse_hex(" 04 A1 3B 7E").unwrap(), uid);
//! ```

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Render bytes as `" XX"` groups: leading space, uppercase, zero-padded.
pub fn hex_spaced(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for byte in bytes {
        // Writing into a String cannot fail.
        let _ = write!(out, " {byte:02X}");
    }
    out
}

/// Render bytes as contiguous uppercase hex pairs.
pub fn hex_compact(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Render bytes as decimal values, each preceded by a single space.
pub fn decimal_spaced(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for byte in bytes {
        let _ = write!(out, " {byte}");
    }
    out
}

/// Parse hex text produced by [`hex_spaced`] or [`hex_compact`].
///
/// Whitespace and `:` separators are ignored; the remaining digits must form
/// whole bytes. Upper and lower case are accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidUidText`] on a non-hex character, an odd number of
/// digits, or empty input.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|c| !c.is_ascii_whitespace() && *c != b':')
        .collect();

    let invalid = |reason: &str| Error::InvalidUidText {
        input: text.to_string(),
        reason: reason.to_string(),
    };

    if digits.is_empty() {
        return Err(invalid("no hex digits"));
    }
    if digits.len() % 2 != 0 {
        return Err(invalid("odd number of hex digits"));
    }

    digits
        .chunks(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(invalid("non-hex character")),
        })
        .collect()
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Transport rendering of a UID inside the report payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UidFormat {
    /// `" 04 A1 3B 7E"`, the rendering the console shows.
    #[default]
    Spaced,
    /// `"04A13B7E"`.
    Compact,
}

impl UidFormat {
    /// Render `bytes` in this format.
    pub fn render(self, bytes: &[u8]) -> String {
        match self {
            Self::Spaced => hex_spaced(bytes),
            Self::Compact => hex_compact(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_reference_uid_renderings() {
        let uid = [0x04, 0xA1, 0x3B, 0x7E];
        assert_eq!(hex_spaced(&uid), " 04 A1 3B 7E");
        assert_eq!(hex_compact(&uid), "04A13B7E");
        assert_eq!(decimal_spaced(&uid), " 4 161 59 126");
    }

    #[rstest]
    #[case(&[], "")]
    #[case(&[0x00], " 00")]
    #[case(&[0x0F, 0xF0], " 0F F0")]
    #[case(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03], " DE AD BE EF 01 02 03")]
    fn test_hex_spaced(#[case] bytes: &[u8], #[case] expected: &str) {
        assert_eq!(hex_spaced(bytes), expected);
        assert_eq!(hex_spaced(bytes).len(), bytes.len() * 3);
    }

    #[rstest]
    #[case(&[0, 9, 10, 255], " 0 9 10 255")]
    #[case(&[100], " 100")]
    fn test_decimal_spaced(#[case] bytes: &[u8], #[case] expected: &str) {
        assert_eq!(decimal_spaced(bytes), expected);
    }

    #[rstest]
    #[case(" 04 A1 3B 7E", vec![0x04, 0xA1, 0x3B, 0x7E])]
    #[case("04a13b7e", vec![0x04, 0xA1, 0x3B, 0x7E])]
    #[case("04:A1:3B:7E", vec![0x04, 0xA1, 0x3B, 0x7E])]
    #[case("  de ad\tbe ef ", vec![0xDE, 0xAD, 0xBE, 0xEF])]
    fn test_parse_hex_valid(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(parse_hex(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("4 A1")]
    #[case("0G")]
    #[case("04-A1")]
    fn test_parse_hex_invalid(#[case] input: &str) {
        assert!(matches!(
            parse_hex(input),
            Err(Error::InvalidUidText { .. })
        ));
    }

    #[test]
    fn test_uid_format_render() {
        let uid = [0x01, 0x23, 0x45, 0x67];
        assert_eq!(UidFormat::Spaced.render(&uid), " 01 23 45 67");
        assert_eq!(UidFormat::Compact.render(&uid), "01234567");
        assert_eq!(UidFormat::default(), UidFormat::Spaced);
    }

    #[test]
    fn test_uid_format_serde_names() {
        let format: UidFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, UidFormat::Compact);
        assert_eq!(serde_json::to_string(&UidFormat::Spaced).unwrap(), "\"spaced\"");
    }
}

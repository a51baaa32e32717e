//! Request payload and response classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use station_core::constants::{NOT_FOUND_MESSAGE, SUCCESS_STATUS_CODES};
use station_core::{LookupResult, Uid, UidFormat};

/// JSON body of every report: `{"uid": "<formatted UID>"}`.
///
/// # Example
///
/// ```
/// use station_core::{Uid, UidFormat};
/// use station_network::ReportPayload;
///
/// let uid = Uid::new(vec![0x04, 0xA1, 0x3B, 0x7E]).unwrap();
/// let payload = ReportPayload::new(&uid, UidFormat::Spaced);
/// assert_eq!(payload.to_json().unwrap(), r#"{"uid":" 04 A1 3B 7E"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub uid: String,
}

impl ReportPayload {
    /// Build the payload for `uid` rendered with `format`.
    pub fn new(uid: &Uid, format: UidFormat) -> Self {
        Self {
            uid: format.render(uid.as_bytes()),
        }
    }

    /// Serialise to the request body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Raw HTTP answer as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Classify the answer.
    ///
    /// - status other than 200/201: `TransportError`
    /// - `{"message": "Not found"}`: `NotFound`
    /// - anything else: `Success`, with `insertData.studentId` (string or
    ///   number) as display text when present
    pub fn classify(&self) -> LookupResult {
        if !SUCCESS_STATUS_CODES.contains(&self.status) {
            return LookupResult::TransportError;
        }

        let Ok(json) = serde_json::from_str::<Value>(&self.body) else {
            return LookupResult::success();
        };

        if json.get("message").and_then(Value::as_str) == Some(NOT_FOUND_MESSAGE) {
            return LookupResult::NotFound;
        }

        let display = match json.pointer("/insertData/studentId") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        LookupResult::Success { display }
    }
}

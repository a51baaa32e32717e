use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of reporting one UID to the configured endpoints.
///
/// Derived from the HTTP status code and, for accepted responses, the JSON
/// body (`message`, `insertData.studentId`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum LookupResult {
    /// Status 200/201; `display` carries `insertData.studentId` when present.
    Success { display: Option<String> },
    /// Status 200/201 with `{"message": "Not found"}`.
    NotFound,
    /// Connection, TLS or HTTP failure, or a status other than 200/201.
    TransportError,
}

impl LookupResult {
    /// Success without a display string.
    #[must_use]
    pub fn success() -> Self {
        Self::Success { display: None }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::TransportError)
    }

    /// Text a status display should show for this outcome.
    ///
    /// `NotFound` blanks the screen; a transport error leaves it untouched
    /// (`None`).
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Success { display } => Some(display.as_deref().unwrap_or("")),
            Self::NotFound => Some(""),
            Self::TransportError => None,
        }
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Success { display: Some(id) } => write!(f, "Success ({id})"),
            Self::Success { display: None } => write!(f, "Success"),
            Self::NotFound => write!(f, "NotFound"),
            Self::TransportError => write!(f, "TransportError"),
        }
    }
}

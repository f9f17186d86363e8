//! Core domain types for a notification run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One sheet row: ordered cell strings, possibly shorter than the header.
pub type Row = Vec<String>;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A row selected for notification in the current run.
///
/// `row` is an owned copy; reconciling one candidate never touches another
/// candidate or the fetched sheet data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based spreadsheet row number (the header is row 1).
    pub row_number: usize,
    /// Working copy of the row's cells.
    pub row: Row,
}

// ---------------------------------------------------------------------------
// Notification payload
// ---------------------------------------------------------------------------

/// Fixed text sent with every notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub description: String,
    pub feature: String,
}

/// JSON body posted to the notification API.
///
/// Sourced fields serialize as `null` when the cell is absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub unit_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    pub description_en: String,
    pub description_th: String,
    pub feature: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub link_content: Option<String>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Error body of a failed notification, classified once at the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// Body that is not a JSON object (plain text, HTML, transport error text).
    RawText(String),
    /// Body that parsed as a JSON object.
    Structured(Map<String, Value>),
}

impl ErrorBody {
    /// Classify a raw response body.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Self::Structured(map),
            _ => Self::RawText(text),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawText(text) => f.write_str(text),
            Self::Structured(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// Result of one notification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// HTTP 200. `response` is the parsed body, or the raw body as a string.
    Delivered { response: Value },
    /// Non-200 response or transport failure (`status_code` is `None`).
    Failed {
        status_code: Option<u16>,
        body: ErrorBody,
    },
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate result of one run. Reported, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of eligible rows found.
    pub candidates: usize,
    /// Notifications delivered and recorded.
    pub succeeded: usize,
    /// Delivery failures plus persistence failures.
    pub failed: usize,
    /// Whether any candidate existed.
    pub had_updates: bool,
}

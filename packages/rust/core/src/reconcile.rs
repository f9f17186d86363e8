//! Write-back of notification outcomes into a candidate row.
//!
//! Only the control cells (`is_send_noti`, `timestamp`, `error`) are touched;
//! every other cell is persisted exactly as it was read.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use paylink_shared::{Candidate, ErrorBody, Outcome, Row, bangkok_timestamp};

use crate::columns::SchemaMap;
use crate::eligibility::DONE_MARKER;

/// Message used when an error body carries no recognizable text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A reconciled row ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub row_number: usize,
    pub row: Row,
    /// Set for failed outcomes.
    pub error_message: Option<String>,
}

/// Set `row[index]`, padding a short row with empty cells first.
pub fn upsert(row: &mut Row, index: usize, value: impl Into<String>) {
    if row.len() <= index {
        row.resize(index, String::new());
        row.push(value.into());
    } else {
        row[index] = value.into();
    }
}

/// Apply `outcome` to the candidate's row.
pub fn reconcile(
    candidate: Candidate,
    outcome: &Outcome,
    schema: &SchemaMap,
    now: DateTime<Utc>,
) -> Reconciliation {
    let Candidate {
        row_number,
        mut row,
    } = candidate;

    match outcome {
        Outcome::Delivered { .. } => {
            if let Some(idx) = schema.is_send_noti {
                upsert(&mut row, idx, DONE_MARKER);
            }
            if let Some(idx) = schema.timestamp {
                upsert(&mut row, idx, bangkok_timestamp(now));
            }
            Reconciliation {
                row_number,
                row,
                error_message: None,
            }
        }
        Outcome::Failed { status_code, body } => {
            let message = error_message(*status_code, body);
            match schema.error {
                Some(idx) => upsert(&mut row, idx, message.clone()),
                // No error column: keep the message visible as a trailing cell.
                None => row.push(message.clone()),
            }
            Reconciliation {
                row_number,
                row,
                error_message: Some(message),
            }
        }
    }
}

/// Human-readable message for a failed notification.
///
/// `message` wins over `error.detail`; text that is not JSON falls back to
/// the HTTP status.
pub fn error_message(status_code: Option<u16>, body: &ErrorBody) -> String {
    match body {
        ErrorBody::Structured(map) => message_from_object(map),
        ErrorBody::RawText(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => message_from_object(&map),
            Ok(_) => UNKNOWN_ERROR.to_string(),
            Err(_) => match status_code {
                Some(code) => format!("HTTP Error: {code}"),
                None => "HTTP Error: Unknown".to_string(),
            },
        },
    }
}

fn message_from_object(map: &Map<String, Value>) -> String {
    if let Some(message) = map.get("message") {
        return render(message);
    }
    if let Some(detail) = map.get("error").and_then(|e| e.get("detail")) {
        return render(detail);
    }
    UNKNOWN_ERROR.to_string()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 3, 4, 5).unwrap()
    }

    fn candidate(cells: &[&str]) -> Candidate {
        Candidate {
            row_number: 7,
            row: strings(cells),
        }
    }

    fn delivered() -> Outcome {
        Outcome::Delivered {
            response: json!({"ok": true}),
        }
    }

    fn failed(status: Option<u16>, body: &str) -> Outcome {
        Outcome::Failed {
            status_code: status,
            body: ErrorBody::from_text(body),
        }
    }

    #[test]
    fn upsert_pads_or_overwrites() {
        let mut row = strings(&["a"]);
        upsert(&mut row, 3, "x");
        assert_eq!(row, strings(&["a", "", "", "x"]));

        upsert(&mut row, 1, "y");
        assert_eq!(row, strings(&["a", "y", "", "x"]));

        upsert(&mut row, 4, "z");
        assert_eq!(row, strings(&["a", "y", "", "x", "z"]));
    }

    #[test]
    fn success_pads_short_row_to_send_noti() {
        let schema = SchemaMap {
            is_send_noti: Some(5),
            ..SchemaMap::default()
        };
        let result = reconcile(candidate(&["101", "https://x", "Done"]), &delivered(), &schema, now());

        assert_eq!(result.row_number, 7);
        assert_eq!(result.row.len(), 6);
        assert_eq!(result.row[3], "");
        assert_eq!(result.row[5], "Done");
        assert_eq!(result.error_message, None);
    }

    #[test]
    fn success_writes_bangkok_timestamp() {
        let schema = SchemaMap {
            is_send_noti: Some(3),
            timestamp: Some(6),
            ..SchemaMap::default()
        };
        let result = reconcile(
            candidate(&["101", "https://x", "Done", "", "0811111111"]),
            &delivered(),
            &schema,
            now(),
        );

        assert_eq!(result.row[3], "Done");
        assert_eq!(result.row[4], "0811111111");
        assert_eq!(result.row.len(), 7);
        assert_eq!(result.row[6], "2025-01-15 10:04:05");
    }

    #[test]
    fn success_overwrites_stale_timestamp_before_send_noti() {
        let schema = SchemaMap {
            timestamp: Some(0),
            is_send_noti: Some(2),
            ..SchemaMap::default()
        };
        let result = reconcile(candidate(&["old", "keep", "", "tail"]), &delivered(), &schema, now());
        assert_eq!(result.row, strings(&["2025-01-15 10:04:05", "keep", "Done", "tail"]));
    }

    #[test]
    fn failure_persists_message_field() {
        let schema = SchemaMap {
            error: Some(4),
            ..SchemaMap::default()
        };
        let result = reconcile(
            candidate(&["101", "https://x", "Done"]),
            &failed(Some(400), r#"{"message":"bad phone"}"#),
            &schema,
            now(),
        );

        assert_eq!(result.row, strings(&["101", "https://x", "Done", "", "bad phone"]));
        assert_eq!(result.error_message.as_deref(), Some("bad phone"));
    }

    #[test]
    fn failure_without_error_column_appends_message() {
        let result = reconcile(
            candidate(&["101", "https://x", "Done"]),
            &failed(Some(502), "<html>Bad Gateway</html>"),
            &SchemaMap::default(),
            now(),
        );

        assert_eq!(result.row.len(), 4);
        assert_eq!(result.row[3], "HTTP Error: 502");
    }

    #[test]
    fn failure_does_not_mark_sent() {
        let schema = SchemaMap {
            is_send_noti: Some(3),
            error: Some(4),
            ..SchemaMap::default()
        };
        let result = reconcile(
            candidate(&["101", "https://x", "Done", ""]),
            &failed(Some(500), "oops"),
            &schema,
            now(),
        );
        assert_eq!(result.row[3], "");
    }

    #[test]
    fn error_message_precedence() {
        let raw = |s: &str| ErrorBody::RawText(s.to_string());

        assert_eq!(
            error_message(Some(400), &raw(r#"{"message":"bad phone"}"#)),
            "bad phone"
        );
        assert_eq!(
            error_message(Some(422), &raw(r#"{"error":{"detail":"unit not found"}}"#)),
            "unit not found"
        );
        assert_eq!(
            error_message(
                Some(422),
                &raw(r#"{"message":"first","error":{"detail":"second"}}"#)
            ),
            "first"
        );
        assert_eq!(error_message(Some(503), &raw("Service Unavailable")), "HTTP Error: 503");
        assert_eq!(error_message(None, &raw("connection refused")), "HTTP Error: Unknown");
        assert_eq!(error_message(Some(500), &raw(r#"{"code":42}"#)), UNKNOWN_ERROR);
        assert_eq!(error_message(Some(500), &raw("[1,2,3]")), UNKNOWN_ERROR);
    }

    #[test]
    fn structured_body_used_without_parsing() {
        let body = ErrorBody::from_text(r#"{"message":{"phone":"invalid"}}"#);
        assert_eq!(error_message(Some(400), &body), r#"{"phone":"invalid"}"#);

        let body = ErrorBody::from_text(r#"{"error":{"detail":"expired link"}}"#);
        assert_eq!(error_message(None, &body), "expired link");
    }

    #[test]
    fn candidate_copy_is_independent() {
        let source = strings(&["101", "https://x", "Done"]);
        let cand = Candidate {
            row_number: 2,
            row: source.clone(),
        };
        let schema = SchemaMap {
            is_send_noti: Some(3),
            ..SchemaMap::default()
        };
        let result = reconcile(cand, &delivered(), &schema, now());
        assert_eq!(source.len(), 3);
        assert_eq!(result.row.len(), 4);
    }
}

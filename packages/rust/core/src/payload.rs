//! Notification payload construction from a candidate row.

use paylink_shared::{NotificationContent, NotificationPayload};

use crate::columns::{SchemaMap, cell};

/// Normalize a cell: `None` for empty or the literal `"null"`, else trimmed.
pub fn xstr(raw: &str) -> Option<String> {
    match raw {
        "" | "null" => None,
        other => Some(other.trim().to_string()),
    }
}

fn sourced(row: &[String], index: Option<usize>) -> Option<String> {
    cell(row, index).and_then(xstr)
}

/// Build the fixed-shape payload for one row.
///
/// Absent columns and short rows yield `null` fields, never an error.
pub fn build_payload(
    row: &[String],
    schema: &SchemaMap,
    content: &NotificationContent,
) -> NotificationPayload {
    NotificationPayload {
        unit_id: sourced(row, schema.land_no),
        title_en: content.title.clone(),
        title_th: content.title.clone(),
        description_en: content.description.clone(),
        description_th: content.description.clone(),
        feature: content.feature.clone(),
        phone: sourced(row, schema.phone),
        email: sourced(row, schema.email),
        link_content: sourced(row, schema.payment_link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> NotificationContent {
        NotificationContent {
            title: "Dear owner".into(),
            description: "Please pay".into(),
            feature: "payment::link".into(),
        }
    }

    #[test]
    fn xstr_normalizes() {
        assert_eq!(xstr(""), None);
        assert_eq!(xstr("null"), None);
        assert_eq!(xstr("  0811111111 "), Some("0811111111".into()));
        assert_eq!(xstr("NULL"), Some("NULL".into()));
    }

    #[test]
    fn payload_from_full_row() {
        let schema = SchemaMap {
            land_no: Some(0),
            payment_link: Some(1),
            phone: Some(2),
            email: Some(3),
            ..SchemaMap::default()
        };
        let row: Vec<String> = ["101", "https://pay/1", "null", " a@b.co"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let payload = build_payload(&row, &schema, &content());

        assert_eq!(payload.unit_id.as_deref(), Some("101"));
        assert_eq!(payload.link_content.as_deref(), Some("https://pay/1"));
        assert_eq!(payload.phone, None);
        assert_eq!(payload.email.as_deref(), Some("a@b.co"));
        assert_eq!(payload.title_en, payload.title_th);
        assert_eq!(payload.description_th, "Please pay");
    }

    #[test]
    fn absent_columns_and_short_rows_are_null() {
        let schema = SchemaMap {
            payment_link: Some(0),
            email: Some(5),
            ..SchemaMap::default()
        };
        let row = vec!["https://pay/2".to_string()];

        let payload = build_payload(&row, &schema, &content());

        assert_eq!(payload.unit_id, None);
        assert_eq!(payload.phone, None);
        assert_eq!(payload.email, None);
        assert_eq!(payload.link_content.as_deref(), Some("https://pay/2"));
    }
}

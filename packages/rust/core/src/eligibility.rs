//! Row eligibility and candidate selection.

use tracing::debug;

use paylink_shared::{Candidate, ColumnLabels, Row};

use crate::columns::{SchemaMap, cell, is_control_label};
use crate::runlog::RunLog;

/// Marker written to the control columns once a step has completed.
pub const DONE_MARKER: &str = "Done";

/// Scheme a payment link must start with.
pub const LINK_PREFIX: &str = "https://";

/// Whether a data row should be notified this run.
///
/// Rows too short to hold both `payment_link` and `is_gen_payment_link` are
/// skipped. A missing `is_send_noti` cell counts as never notified.
pub fn is_eligible(row: &[String], schema: &SchemaMap) -> bool {
    let (Some(link_idx), Some(gen_idx)) = (schema.payment_link, schema.is_gen_payment_link)
    else {
        return false;
    };
    if row.len() <= link_idx.max(gen_idx) {
        return false;
    }

    let generated = row[gen_idx] == DONE_MARKER;
    let has_link = row[link_idx].starts_with(LINK_PREFIX);
    let already_sent = cell(row, schema.is_send_noti) == Some(DONE_MARKER);

    generated && has_link && !already_sent
}

/// Pick the candidates from a fetched sheet (`rows[0]` is the header).
///
/// Every eligible row is dumped to the run log, one `header: value` line per
/// column whose header is not a control label, before it is added.
pub fn select_candidates(
    rows: &[Row],
    schema: &SchemaMap,
    labels: &ColumnLabels,
    log: &mut RunLog,
) -> Vec<Candidate> {
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for (offset, row) in data.iter().enumerate() {
        // Header is sheet row 1, so data starts at row 2.
        let row_number = offset + 2;

        if !is_eligible(row, schema) {
            debug!(row_number, cells = row.len(), "row not eligible");
            continue;
        }

        log.line(format!("row {row_number} is eligible for notification"));
        for (header, value) in headers.iter().zip(row.iter()) {
            if !is_control_label(header, labels) {
                log.line(format!("{header}: {value}"));
            }
        }
        log.line("-".repeat(30));

        candidates.push(Candidate {
            row_number,
            row: row.clone(),
        });
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::resolve;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn header() -> Vec<String> {
        strings(&[
            "หมายเลขแปลง ตัวอย่างเช่น 1099-001",
            "Payment Link",
            "is Gen Payment Link",
            "is Send Noti",
            "เบอร์โทรศัพท์",
            "อีเมล์",
        ])
    }

    fn schema() -> SchemaMap {
        resolve(&header(), &ColumnLabels::default())
    }

    #[test]
    fn eligible_without_send_noti_cell() {
        let row = strings(&["101", "https://x", "Done"]);
        assert!(is_eligible(&row, &schema()));
    }

    #[test]
    fn not_eligible_when_already_sent() {
        let row = strings(&["101", "https://x", "Done", "Done"]);
        assert!(!is_eligible(&row, &schema()));
    }

    #[test]
    fn empty_send_noti_cell_is_eligible() {
        let row = strings(&["101", "https://x", "Done", ""]);
        assert!(is_eligible(&row, &schema()));
    }

    #[test]
    fn requires_generated_marker_and_https_link() {
        let s = schema();
        assert!(!is_eligible(&strings(&["1", "https://x", "Pending"]), &s));
        assert!(!is_eligible(&strings(&["1", "http://x", "Done"]), &s));
        assert!(!is_eligible(&strings(&["1", "", "Done"]), &s));
        // Marker comparison is exact.
        assert!(!is_eligible(&strings(&["1", "https://x", "done"]), &s));
    }

    #[test]
    fn short_row_is_skipped_without_panic() {
        let s = schema();
        assert!(!is_eligible(&strings(&["101", "https://x"]), &s));
        assert!(!is_eligible(&[], &s));
    }

    #[test]
    fn absent_send_noti_column_is_vacuous() {
        let s = resolve(
            &strings(&["Payment Link", "is Gen Payment Link"]),
            &ColumnLabels::default(),
        );
        assert!(is_eligible(&strings(&["https://x", "Done"]), &s));
    }

    #[test]
    fn selection_numbers_rows_and_dumps_displayed_columns() {
        let rows = vec![
            header(),
            strings(&["100", "https://pay/0", "Done", "Done"]),
            strings(&["101", "https://pay/1", "Done", "", "0811111111", "a@b.co"]),
        ];
        let s = schema();
        let mut log = RunLog::new();

        let candidates = select_candidates(&rows, &s, &ColumnLabels::default(), &mut log);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].row_number, 3);
        assert_eq!(candidates[0].row, rows[2]);

        let text = log.text();
        assert!(text.contains("หมายเลขแปลง ตัวอย่างเช่น 1099-001: 101"));
        assert!(text.contains("เบอร์โทรศัพท์: 0811111111"));
        assert!(text.contains("อีเมล์: a@b.co"));
        assert!(!text.contains("Payment Link:"));
        assert!(!text.contains("is Send Noti:"));
        assert!(text.contains(&"-".repeat(30)));
    }

    #[test]
    fn dump_hides_every_copy_of_control_headers() {
        let rows = vec![
            strings(&[
                "Payment Link",
                "X",
                "Payment Link",
                "is Gen Payment Link",
                "is Send Noti",
                "Timestamp",
                "Error",
            ]),
            strings(&["https://old", "x", "https://pay/1", "Done", "", "ts", "err"]),
        ];
        let labels = ColumnLabels::default();
        let s = resolve(&rows[0], &labels);
        let mut log = RunLog::new();

        let candidates = select_candidates(&rows, &s, &labels, &mut log);

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            log.lines(),
            [
                "row 2 is eligible for notification".to_string(),
                "X: x".to_string(),
                "-".repeat(30),
            ]
        );
    }

    #[test]
    fn selection_of_header_only_sheet_is_empty() {
        let mut log = RunLog::new();
        let labels = ColumnLabels::default();
        assert!(select_candidates(&[header()], &schema(), &labels, &mut log).is_empty());
        assert!(select_candidates(&[], &schema(), &labels, &mut log).is_empty());
        assert!(log.is_empty());
    }
}

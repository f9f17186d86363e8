//! End-to-end run: fetch → resolve columns → select → notify → reconcile → persist.
//!
//! Candidates are processed strictly one after another in sheet order. A row
//! that fails to notify or to persist is counted and the run moves on; only
//! failures before the loop (fetch, missing columns) abort the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use paylink_shared::{
    Candidate, ColumnLabels, NotificationContent, NotificationPayload, Notifier, NotifierError,
    Result, RunSummary, Settings, WorkTable,
};

use crate::columns::{SchemaMap, resolve};
use crate::eligibility::select_candidates;
use crate::payload::build_payload;
use crate::reconcile::reconcile;
use crate::runlog::RunLog;

/// Configuration injected into the [`Coordinator`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Header labels to resolve.
    pub columns: ColumnLabels,
    /// Fixed notification text.
    pub content: NotificationContent,
    /// Delay between consecutive candidates.
    pub pacing: Duration,
}

impl From<&Settings> for RunConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            columns: settings.columns.clone(),
            content: settings.content.clone(),
            pacing: settings.pacing,
        }
    }
}

/// Drives one notification run against a table and a notifier.
pub struct Coordinator<'a> {
    config: RunConfig,
    table: &'a dyn WorkTable,
    notifier: &'a dyn Notifier,
    /// Source of `now` for the timestamp column; `Utc::now` outside tests.
    clock: fn() -> DateTime<Utc>,
}

impl<'a> Coordinator<'a> {
    pub fn new(config: RunConfig, table: &'a dyn WorkTable, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            table,
            notifier,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for the timestamp column.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute a full run, recording diagnostics into `log`.
    #[instrument(skip_all)]
    pub async fn run(&self, log: &mut RunLog) -> Result<RunSummary> {
        let rows = self.table.fetch_rows().await?;
        let Some(headers) = rows.first() else {
            return Err(NotifierError::validation("sheet has no data"));
        };

        log.line(format!("processing sheet data: {} rows", rows.len()));

        let schema = resolve(headers, &self.config.columns);
        log.line(format!("column positions: {schema}"));
        schema.validate()?;

        let candidates = select_candidates(&rows, &schema, &self.config.columns, log);
        log.line(format!("rows to notify: {}", candidates.len()));

        let mut summary = RunSummary {
            candidates: candidates.len(),
            had_updates: !candidates.is_empty(),
            ..RunSummary::default()
        };

        let total = candidates.len();
        for (i, candidate) in candidates.into_iter().enumerate() {
            if self.process(candidate, &schema, log).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }

            if i + 1 < total && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        info!(
            candidates = summary.candidates,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "run complete"
        );

        Ok(summary)
    }

    /// Notify, reconcile and persist one candidate. Returns `true` on full success.
    async fn process(&self, candidate: Candidate, schema: &SchemaMap, log: &mut RunLog) -> bool {
        let row_number = candidate.row_number;
        log.line(format!(
            "row {row_number}: sending notification ({} cells)",
            candidate.row.len()
        ));

        let payload = build_payload(&candidate.row, schema, &self.config.content);
        let outcome = self.notifier.notify(&payload).await;
        let delivered = outcome.is_delivered();

        if delivered {
            log.line(format!("row {row_number}: notification sent"));
        } else {
            log.line(format!(
                "row {row_number}: notification failed for unit {}",
                unit_label(&payload)
            ));
        }

        let reconciled = reconcile(candidate, &outcome, schema, (self.clock)());
        if let Some(message) = &reconciled.error_message {
            log.line(format!("row {row_number}: error: {message}"));
        }

        let cells = reconciled.row.len();
        match self.table.write_row(row_number, &reconciled.row).await {
            Ok(()) => {
                log.line(format!("row {row_number}: sheet updated ({cells} cells)"));
                delivered
            }
            Err(e) => {
                warn!(row_number, cells, error = %e, "failed to persist row");
                log.line(format!(
                    "row {row_number}: failed to update sheet ({cells} cells): {e}"
                ));
                false
            }
        }
    }
}

fn unit_label(payload: &NotificationPayload) -> &str {
    payload.unit_id.as_deref().unwrap_or("unspecified")
}

//! Contracts for the external collaborators a run talks to.
//!
//! The run coordinator only sees these traits; concrete adapters live in the
//! `paylink-sheets`, `paylink-dispatch` and `paylink-report` crates.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{NotificationPayload, Outcome, Row};

/// Spreadsheet-backed worklist.
#[async_trait]
pub trait WorkTable: Send + Sync {
    /// Read the whole sheet. The first row is the header.
    async fn fetch_rows(&self) -> Result<Vec<Row>>;

    /// Overwrite columns `A..` of the 1-based `row_number` with `values`.
    async fn write_row(&self, row_number: usize, values: &[String]) -> Result<()>;
}

/// Outbound notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one notification. Every failure is folded into [`Outcome::Failed`].
    async fn notify(&self, payload: &NotificationPayload) -> Outcome;
}

/// Chat channel receiving the run log.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Publish `text`, then mention `mentions` in a separate message if non-empty.
    async fn publish(&self, text: &str, mentions: &[String]) -> Result<()>;
}

//! Google Sheets values API adapter.
//!
//! Implements [`WorkTable`] over the v4 REST endpoints with a bearer token:
//! the whole tab is read in one `GET`, and each candidate row is written back
//! with a single `PUT` addressing `A<n>:<last column><n>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use paylink_shared::{NotifierError, Result, Row, Settings, WorkTable};

/// Default timeout in seconds for Sheets API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for Sheets requests.
const USER_AGENT: &str = concat!("paylink/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for one spreadsheet tab.
#[derive(Debug, Clone)]
pub struct SheetsOptions {
    /// Base URL, e.g. `https://sheets.googleapis.com/v4/spreadsheets`.
    pub api_base: Url,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Bearer access token.
    pub access_token: String,
    pub timeout_secs: u64,
}

impl From<&Settings> for SheetsOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            api_base: settings.sheets_api_base.clone(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_name: settings.sheet_name.clone(),
            access_token: settings.sheets_token.clone(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [&'a [String]; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: u64,
}

// ---------------------------------------------------------------------------
// SheetsClient
// ---------------------------------------------------------------------------

/// Sheets-backed worklist.
pub struct SheetsClient {
    client: Client,
    options: SheetsOptions,
}

impl SheetsClient {
    pub fn new(options: SheetsOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| NotifierError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// `{base}/{spreadsheet_id}/values/{range}` with the range percent-encoded.
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = self.options.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                NotifierError::config(format!(
                    "sheets api base cannot be a base URL: {}",
                    self.options.api_base
                ))
            })?
            .pop_if_empty()
            .push(&self.options.spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifierError::Sheet(format!("{what}: HTTP {status}: {body}")))
    }
}

#[async_trait]
impl WorkTable for SheetsClient {
    #[instrument(skip_all)]
    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        let url = self.values_url(&quote_sheet(&self.options.sheet_name))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.options.access_token)
            .send()
            .await
            .map_err(|e| NotifierError::Sheet(format!("failed to read sheet: {e}")))?;
        let response = Self::check(response, "failed to read sheet").await?;

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| NotifierError::parse(format!("invalid values response: {e}")))?;

        if range.values.is_empty() {
            return Err(NotifierError::Sheet("no data found in sheet".into()));
        }

        let rows: Vec<Row> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();

        info!(rows = rows.len(), "sheet fetched");
        Ok(rows)
    }

    #[instrument(skip_all, fields(row_number = row_number, cells = values.len()))]
    async fn write_row(&self, row_number: usize, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Err(NotifierError::validation(format!(
                "refusing to write empty row {row_number}"
            )));
        }

        let range = row_range(&self.options.sheet_name, row_number, values.len());
        debug!(%range, "updating row");

        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = UpdateRequest {
            range: &range,
            major_dimension: "ROWS",
            values: [values],
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.options.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::Sheet(format!("failed to update {range}: {e}")))?;
        let response = Self::check(response, &format!("failed to update {range}")).await?;

        let updated: UpdateResponse = response.json().await.unwrap_or_default();
        debug!(updated_cells = updated.updated_cells, "row updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// A1 notation helpers
// ---------------------------------------------------------------------------

/// Spreadsheet column letters for a 1-based column number (`27` → `AA`).
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a tab name for use in an A1 range.
pub fn quote_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// A1 range covering `cells` columns of one row, starting at column A.
pub fn row_range(sheet_name: &str, row_number: usize, cells: usize) -> String {
    let last = column_letter(cells.max(1));
    format!("{}!A{row_number}:{last}{row_number}", quote_sheet(sheet_name))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Inbound trigger boundary: authorize, run, report, respond.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use paylink_shared::{Reporter, RunSummary, Settings};

use crate::coordinator::Coordinator;
use crate::runlog::RunLog;

/// Header carrying the caller's credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// An inbound run request.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub headers: HashMap<String, String>,
}

impl Invocation {
    /// Invocation carrying only the API key header.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert(API_KEY_HEADER.to_string(), key.into());
        Self { headers }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// JSON body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

/// Status code plus body, shaped like an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl InvocationResponse {
    fn new(status_code: u16, success: bool, message: String, summary: Option<RunSummary>) -> Self {
        Self {
            status_code,
            body: ResponseBody {
                success,
                message,
                summary,
            },
        }
    }
}

/// Who gets mentioned in the report channel.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    /// Mentioned whenever a run had updates.
    pub on_updates: Vec<String>,
    /// Added on any failed candidate, and alone on fatal errors.
    pub escalation: Vec<String>,
}

impl From<&Settings> for Recipients {
    fn from(settings: &Settings) -> Self {
        Self {
            on_updates: settings.recipients.clone(),
            escalation: settings.escalation_ids.clone(),
        }
    }
}

/// Handles one trigger invocation end to end.
pub struct TriggerHandler<'a> {
    expected_key: String,
    coordinator: Coordinator<'a>,
    reporter: &'a dyn Reporter,
    recipients: Recipients,
}

impl<'a> TriggerHandler<'a> {
    pub fn new(
        expected_key: impl Into<String>,
        coordinator: Coordinator<'a>,
        reporter: &'a dyn Reporter,
        recipients: Recipients,
    ) -> Self {
        Self {
            expected_key: expected_key.into(),
            coordinator,
            reporter,
            recipients,
        }
    }

    /// Authorize and execute a run. The run log is flushed exactly once.
    pub async fn handle(&self, invocation: &Invocation) -> InvocationResponse {
        if invocation.header(API_KEY_HEADER) != Some(self.expected_key.as_str()) {
            warn!("rejected invocation with invalid API key");
            return InvocationResponse::new(403, false, "Invalid API key".into(), None);
        }

        let run_id = Uuid::now_v7();
        info!(%run_id, "run started");

        let mut log = RunLog::new();
        match self.coordinator.run(&mut log).await {
            Ok(summary) => {
                let message = format!(
                    "payment link notifications: {} succeeded, {} failed",
                    summary.succeeded, summary.failed
                );

                let mentions = if summary.had_updates {
                    log.line(message.clone());
                    let mut mentions = self.recipients.on_updates.clone();
                    if summary.failed > 0 {
                        mentions.extend(self.recipients.escalation.iter().cloned());
                    }
                    mentions
                } else {
                    log.line("no rows to notify");
                    Vec::new()
                };

                self.flush(&log, &mentions).await;
                info!(%run_id, succeeded = summary.succeeded, failed = summary.failed, "run finished");
                InvocationResponse::new(200, true, message, Some(summary))
            }
            Err(e) => {
                let message = format!("run failed: {e}");
                log.line(message.clone());
                self.flush(&log, &self.recipients.escalation).await;
                warn!(%run_id, error = %e, "run aborted");
                InvocationResponse::new(500, false, message, None)
            }
        }
    }

    async fn flush(&self, log: &RunLog, mentions: &[String]) {
        if let Err(e) = self.reporter.publish(&log.text(), mentions).await {
            warn!(error = %e, "failed to deliver run log");
        }
    }
}

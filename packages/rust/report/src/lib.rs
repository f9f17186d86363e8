//! Chat webhook reporter for run logs.
//!
//! The log is split into chunks that fit a single webhook message. The first
//! chunk carries a titled header with the Bangkok timestamp; later chunks are
//! numbered `Continued (i/n)`. Mentions go out as a separate final message.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use paylink_shared::{NotifierError, Reporter, Result, Settings, bangkok_timestamp};

/// Default timeout in seconds for webhook posts.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for webhook requests.
const USER_AGENT: &str = concat!("paylink/", env!("CARGO_PKG_VERSION"));

/// Webhook target and message formatting.
#[derive(Debug, Clone)]
pub struct ReporterOptions {
    pub webhook_url: Url,
    /// Bold heading of the first message.
    pub title: String,
    /// Maximum characters of log text per message.
    pub chunk_size: usize,
}

impl From<&Settings> for ReporterOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            webhook_url: settings.webhook_url.clone(),
            title: settings.report_title.clone(),
            chunk_size: settings.chunk_size,
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Discord-compatible webhook reporter.
pub struct DiscordReporter {
    client: Client,
    options: ReporterOptions,
}

impl DiscordReporter {
    pub fn new(options: ReporterOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifierError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// Messages to post for `text`, in order.
    pub fn render(&self, text: &str, mentions: &[String], timestamp: &str) -> Vec<String> {
        let chunks = split_chunks(text, self.options.chunk_size);
        let total = chunks.len();

        let mut messages: Vec<String> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                if i == 0 {
                    format!(
                        "**{} - {timestamp}**\n```\n{chunk}\n```",
                        self.options.title
                    )
                } else {
                    format!("**Continued ({}/{total}):**\n```\n{chunk}\n```", i + 1)
                }
            })
            .collect();

        if !messages.is_empty() && !mentions.is_empty() {
            messages.push(mention_line(mentions));
        }
        messages
    }

    async fn post(&self, content: &str) -> Result<()> {
        self.client
            .post(self.options.webhook_url.clone())
            .json(&WebhookMessage { content })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| NotifierError::Report(e.to_string()))
    }
}

#[async_trait]
impl Reporter for DiscordReporter {
    #[instrument(skip_all, fields(chars = text.chars().count(), mentions = mentions.len()))]
    async fn publish(&self, text: &str, mentions: &[String]) -> Result<()> {
        let messages = self.render(text, mentions, &bangkok_timestamp(Utc::now()));
        if messages.is_empty() {
            debug!("empty run log, nothing to publish");
            return Ok(());
        }

        let mut failures = 0usize;
        for (i, message) in messages.iter().enumerate() {
            if let Err(e) = self.post(message).await {
                warn!(index = i + 1, error = %e, "webhook post failed");
                failures += 1;
            }
        }

        if failures > 0 {
            return Err(NotifierError::Report(format!(
                "{failures} of {} webhook messages failed",
                messages.len()
            )));
        }
        Ok(())
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Counts `char`s, not bytes, so multi-byte text is never cut mid-character.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// `cc <@id> <@id>` line mentioning each recipient.
pub fn mention_line(ids: &[String]) -> String {
    let mentions: Vec<String> = ids.iter().map(|id| format!("<@{id}>")).collect();
    format!("cc {}", mentions.join(" "))
}

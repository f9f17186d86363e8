//! HTTP delivery of payment-link notifications.
//!
//! [`HttpNotifier`] posts the payload as JSON with the configured
//! `Authorization` header. Only HTTP 200 counts as delivered; every other
//! response, and every transport failure, becomes [`Outcome::Failed`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use paylink_shared::{
    ErrorBody, NotificationPayload, Notifier, NotifierError, Outcome, Result, Settings,
};

/// User-Agent string for notification requests.
const USER_AGENT: &str = concat!("paylink/", env!("CARGO_PKG_VERSION"));

/// Endpoint and credentials for the notification API.
#[derive(Debug, Clone)]
pub struct NotifierOptions {
    pub api_url: Url,
    /// Sent verbatim as the `Authorization` header (e.g. `Bearer ...`).
    pub authorization: String,
    pub timeout: Duration,
}

impl From<&Settings> for NotifierOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            api_url: settings.notification_url.clone(),
            authorization: settings.notification_token.clone(),
            timeout: settings.notification_timeout,
        }
    }
}

/// Notification API client.
pub struct HttpNotifier {
    client: Client,
    options: NotifierOptions,
}

impl HttpNotifier {
    pub fn new(options: NotifierOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(|e| NotifierError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    #[instrument(skip_all, fields(unit_id = payload.unit_id.as_deref().unwrap_or("-")))]
    async fn notify(&self, payload: &NotificationPayload) -> Outcome {
        let response = match self
            .client
            .post(self.options.api_url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.options.authorization)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "notification request failed");
                return Outcome::Failed {
                    status_code: None,
                    body: ErrorBody::RawText(e.to_string()),
                };
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%status, error = %e, "failed to read notification response");
                if status == StatusCode::OK {
                    return Outcome::Delivered {
                        response: Value::Null,
                    };
                }
                return Outcome::Failed {
                    status_code: Some(status.as_u16()),
                    body: ErrorBody::RawText(e.to_string()),
                };
            }
        };

        if status == StatusCode::OK {
            debug!("notification delivered");
            // A 200 is a delivery even when the body is not JSON.
            let response = serde_json::from_str(&text).unwrap_or(Value::String(text));
            Outcome::Delivered { response }
        } else {
            warn!(%status, "notification rejected");
            Outcome::Failed {
                status_code: Some(status.as_u16()),
                body: ErrorBody::from_text(text),
            }
        }
    }
}

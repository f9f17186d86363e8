//! Application configuration for the payment-link notifier.
//!
//! User config lives at `~/.paylink/paylink.toml`.
//! The file never holds secrets: it names the environment variables that do.
//! [`resolve_settings`] validates everything once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NotifierError, Result};
use crate::types::NotificationContent;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "paylink.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".paylink";

// ---------------------------------------------------------------------------
// Config structs (matching paylink.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Spreadsheet location and credentials.
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Notification API settings.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Chat webhook receiving the run log.
    #[serde(default)]
    pub report: ReportConfig,

    /// Inbound trigger credential.
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Header labels recognized in the sheet's first row.
    #[serde(default)]
    pub columns: ColumnLabels,
}

/// `[sheet]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet ID from the sheet URL.
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Tab name to read and write.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Base URL of the Sheets values API.
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,

    /// Name of the env var holding a bearer access token.
    #[serde(default = "default_sheets_token_env")]
    pub access_token_env: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            api_base: default_sheets_api_base(),
            access_token_env: default_sheets_token_env(),
        }
    }
}

fn default_sheet_name() -> String {
    "ชีต1".into()
}
fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".into()
}
fn default_sheets_token_env() -> String {
    "PAYLINK_SHEETS_TOKEN".into()
}

/// `[notification]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notification endpoint (POST).
    #[serde(default)]
    pub api_url: String,

    /// Name of the env var holding the `Authorization` header value.
    #[serde(default = "default_notification_token_env")]
    pub api_token_env: String,

    /// Title sent as both `title_en` and `title_th`.
    #[serde(default = "default_title")]
    pub title: String,

    /// Description sent as both `description_en` and `description_th`.
    #[serde(default = "default_description")]
    pub description: String,

    /// Feature tag.
    #[serde(default = "default_feature")]
    pub feature: String,

    /// Delay between consecutive candidates.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token_env: default_notification_token_env(),
            title: default_title(),
            description: default_description(),
            feature: default_feature(),
            pacing_ms: default_pacing_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_notification_token_env() -> String {
    "PAYLINK_NOTIFY_TOKEN".into()
}
fn default_title() -> String {
    "เรียน ท่านเจ้าของบ้าน".into()
}
fn default_description() -> String {
    "ตามที่ท่านได้แจ้งความประสงค์ในการชำระค่าบริการสาธารณะ กรุณาดำเนินการชำระเงินโดยการกดปุ่ม \
     \"ดำเนินการชำระเงิน\" ด้านล่างภายใน 24 ชั่วโมง นับจากได้รับข้อความนี้ \
     เงื่อนไขการชำระเงินเป็นไปตามที่ธนาคารกำหนด ขอขอบพระคุณมา ณ โอกาสนี้"
        .into()
}
fn default_feature() -> String {
    "payment::link".into()
}
fn default_pacing_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[report]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Name of the env var holding the webhook URL.
    #[serde(default = "default_webhook_env")]
    pub webhook_url_env: String,

    /// Bold title prefixed to the first log message.
    #[serde(default = "default_report_title")]
    pub title: String,

    /// Maximum characters per log chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Users mentioned when a run had updates.
    #[serde(default)]
    pub recipient_ids: Vec<String>,

    /// Optional `{"user_ids": [...]}` file overriding `recipient_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients_file: Option<String>,

    /// Users mentioned on failures and fatal errors.
    #[serde(default)]
    pub escalation_ids: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_webhook_env(),
            title: default_report_title(),
            chunk_size: default_chunk_size(),
            recipient_ids: Vec::new(),
            recipients_file: None,
            escalation_ids: Vec::new(),
        }
    }
}

fn default_webhook_env() -> String {
    "PAYLINK_WEBHOOK_URL".into()
}
fn default_report_title() -> String {
    "SABAI Payment Link Notification Log".into()
}
fn default_chunk_size() -> usize {
    1900
}

/// `[trigger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Name of the env var holding the expected `x-api-key` value.
    #[serde(default = "default_trigger_env")]
    pub api_key_env: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_trigger_env(),
        }
    }
}

fn default_trigger_env() -> String {
    "PAYLINK_TRIGGER_SECRET".into()
}

/// `[columns]` section: exact header labels for each semantic field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLabels {
    pub payment_link: String,
    pub is_gen_payment_link: String,
    pub is_send_noti: String,
    pub land_no: String,
    pub phone: String,
    pub email: String,
    pub timestamp: String,
    pub error: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            payment_link: "Payment Link".into(),
            is_gen_payment_link: "is Gen Payment Link".into(),
            is_send_noti: "is Send Noti".into(),
            land_no: "หมายเลขแปลง ตัวอย่างเช่น 1099-001".into(),
            phone: "เบอร์โทรศัพท์".into(),
            email: "อีเมล์".into(),
            timestamp: "Timestamp".into(),
            error: "Error".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings (runtime, validated once at startup)
// ---------------------------------------------------------------------------

/// Fully validated runtime settings, secrets included.
#[derive(Debug, Clone)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub sheets_api_base: Url,
    pub sheets_token: String,
    pub notification_url: Url,
    pub notification_token: String,
    pub notification_timeout: Duration,
    pub content: NotificationContent,
    pub pacing: Duration,
    pub webhook_url: Url,
    pub report_title: String,
    pub chunk_size: usize,
    pub recipients: Vec<String>,
    pub escalation_ids: Vec<String>,
    pub trigger_key: String,
    pub columns: ColumnLabels,
}

/// Validate `config` against the process environment.
pub fn resolve_settings(config: &AppConfig) -> Result<Settings> {
    resolve_settings_with(config, |name| std::env::var(name).ok())
}

/// Validate `config`, reading secrets through `lookup`.
///
/// Every problem is collected so a single error names all of them.
pub fn resolve_settings_with(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut problems: Vec<String> = Vec::new();

    let mut secret = |var: &str| -> String {
        match lookup(var) {
            Some(val) if !val.trim().is_empty() => val,
            _ => {
                problems.push(format!("environment variable {var} is not set"));
                String::new()
            }
        }
    };

    let sheets_token = secret(&config.sheet.access_token_env);
    let notification_token = secret(&config.notification.api_token_env);
    let webhook_raw = secret(&config.report.webhook_url_env);
    let trigger_key = secret(&config.trigger.api_key_env);

    if config.sheet.spreadsheet_id.trim().is_empty() {
        problems.push("sheet.spreadsheet_id is empty".into());
    }
    if config.report.chunk_size == 0 {
        problems.push("report.chunk_size must be greater than zero".into());
    }

    let sheets_api_base = parse_url("sheet.api_base", &config.sheet.api_base, &mut problems);
    let notification_url =
        parse_url("notification.api_url", &config.notification.api_url, &mut problems);
    let webhook_url = if webhook_raw.is_empty() {
        None
    } else {
        parse_url(&config.report.webhook_url_env, &webhook_raw, &mut problems)
    };

    match (sheets_api_base, notification_url, webhook_url) {
        (Some(sheets_api_base), Some(notification_url), Some(webhook_url))
            if problems.is_empty() =>
        {
            Ok(Settings {
                spreadsheet_id: config.sheet.spreadsheet_id.clone(),
                sheet_name: config.sheet.sheet_name.clone(),
                sheets_api_base,
                sheets_token,
                notification_url,
                notification_token,
                notification_timeout: Duration::from_secs(config.notification.timeout_secs),
                content: NotificationContent {
                    title: config.notification.title.clone(),
                    description: config.notification.description.clone(),
                    feature: config.notification.feature.clone(),
                },
                pacing: Duration::from_millis(config.notification.pacing_ms),
                webhook_url,
                report_title: config.report.title.clone(),
                chunk_size: config.report.chunk_size,
                recipients: load_recipients(&config.report),
                escalation_ids: config.report.escalation_ids.clone(),
                trigger_key,
                columns: config.columns.clone(),
            })
        }
        _ => Err(NotifierError::config(problems.join("; "))),
    }
}

fn parse_url(name: &str, raw: &str, problems: &mut Vec<String>) -> Option<Url> {
    if raw.trim().is_empty() {
        problems.push(format!("{name} is empty"));
        return None;
    }
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            problems.push(format!("{name} is not a valid URL: {e}"));
            None
        }
    }
}

#[derive(Deserialize)]
struct RecipientsFile {
    #[serde(default)]
    user_ids: Vec<String>,
}

/// Recipient ids from `recipients_file` when readable, else `recipient_ids`.
pub fn load_recipients(report: &ReportConfig) -> Vec<String> {
    let Some(path) = report.recipients_file.as_deref() else {
        return report.recipient_ids.clone();
    };

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<RecipientsFile>(&s).map_err(|e| e.to_string()));

    match parsed {
        Ok(file) => file.user_ids,
        Err(e) => {
            tracing::debug!(path, error = %e, "recipients file unusable, using configured ids");
            report.recipient_ids.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.paylink/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NotifierError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.paylink/paylink.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotifierError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NotifierError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NotifierError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NotifierError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotifierError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sheet.spreadsheet_id = "sheet-123".into();
        config.notification.api_url = "https://api.example.com/noti".into();
        config
    }

    fn all_secrets(name: &str) -> Option<String> {
        match name {
            "PAYLINK_WEBHOOK_URL" => Some("https://chat.example.com/hook".into()),
            _ => Some(format!("secret-for-{name}")),
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("spreadsheet_id"));
        assert!(toml_str.contains("PAYLINK_NOTIFY_TOKEN"));
        assert!(toml_str.contains("is Send Noti"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.notification.pacing_ms, 1000);
        assert_eq!(parsed.report.chunk_size, 1900);
        assert_eq!(parsed.columns, ColumnLabels::default());
    }

    #[test]
    fn partial_columns_section_keeps_defaults() {
        let toml_str = r#"
[sheet]
spreadsheet_id = "abc"

[columns]
timestamp = "Sent At"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sheet.spreadsheet_id, "abc");
        assert_eq!(config.columns.timestamp, "Sent At");
        assert_eq!(config.columns.payment_link, "Payment Link");
    }

    #[test]
    fn resolve_complete_settings() {
        let settings = resolve_settings_with(&complete_config(), all_secrets).expect("resolve");
        assert_eq!(settings.spreadsheet_id, "sheet-123");
        assert_eq!(settings.trigger_key, "secret-for-PAYLINK_TRIGGER_SECRET");
        assert_eq!(settings.webhook_url.as_str(), "https://chat.example.com/hook");
        assert_eq!(settings.pacing, Duration::from_secs(1));
        assert_eq!(settings.content.feature, "payment::link");
    }

    #[test]
    fn resolve_reports_every_missing_item() {
        let err = resolve_settings_with(&AppConfig::default(), |_| None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("config error"));
        assert!(msg.contains("PAYLINK_SHEETS_TOKEN"));
        assert!(msg.contains("PAYLINK_TRIGGER_SECRET"));
        assert!(msg.contains("spreadsheet_id"));
        assert!(msg.contains("notification.api_url"));
    }

    #[test]
    fn resolve_rejects_invalid_url() {
        let mut config = complete_config();
        config.notification.api_url = "not a url".into();
        let err = resolve_settings_with(&config, all_secrets).unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn recipients_fall_back_when_file_missing() {
        let report = ReportConfig {
            recipient_ids: vec!["111".into()],
            recipients_file: Some("/nonexistent/paylink-users.json".into()),
            ..ReportConfig::default()
        };
        assert_eq!(load_recipients(&report), vec!["111".to_string()]);
    }

    #[test]
    fn recipients_file_overrides_config() {
        let path = std::env::temp_dir().join(format!(
            "paylink-recipients-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"user_ids": ["222", "333"]}"#).expect("write");

        let report = ReportConfig {
            recipient_ids: vec!["111".into()],
            recipients_file: Some(path.to_string_lossy().to_string()),
            ..ReportConfig::default()
        };
        assert_eq!(
            load_recipients(&report),
            vec!["222".to_string(), "333".to_string()]
        );

        let _ = std::fs::remove_file(&path);
    }
}

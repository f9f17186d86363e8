//! Shared types, error model, and configuration for the payment-link notifier.
//!
//! This crate is the foundation depended on by all other paylink crates.
//! It provides:
//! - [`NotifierError`], the unified error type
//! - Domain types ([`Row`], [`Candidate`], [`Outcome`], [`ErrorBody`], [`RunSummary`])
//! - Collaborator traits ([`WorkTable`], [`Notifier`], [`Reporter`])
//! - Configuration ([`AppConfig`], [`Settings`], config loading)

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ColumnLabels, NotificationConfig, ReportConfig, Settings, SheetConfig,
    TriggerConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    load_recipients, resolve_settings,
};
pub use error::{NotifierError, Result};
pub use time::{BANGKOK, bangkok_timestamp};
pub use traits::{Notifier, Reporter, WorkTable};
pub use types::{
    Candidate, ErrorBody, NotificationContent, NotificationPayload, Outcome, Row, RunSummary,
};

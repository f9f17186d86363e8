//! Error types for the payment-link notifier.
//!
//! Library crates use [`NotifierError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all notifier operations.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A mandatory column label was not found in the header row.
    #[error("missing required column: {field}")]
    MissingColumn { field: &'static str },

    /// Spreadsheet read or write failure.
    #[error("sheet error: {0}")]
    Sheet(String),

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// Response or payload parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Report channel delivery error.
    #[error("report error: {0}")]
    Report(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty sheet, empty write, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NotifierError>;

impl NotifierError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NotifierError::config("missing webhook url");
        assert_eq!(err.to_string(), "config error: missing webhook url");

        let err = NotifierError::MissingColumn {
            field: "is_send_noti",
        };
        assert_eq!(err.to_string(), "missing required column: is_send_noti");

        let err = NotifierError::Sheet("HTTP 403".into());
        assert!(err.to_string().contains("403"));
    }
}

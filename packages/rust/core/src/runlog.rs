//! Per-run log buffer flushed to the report channel at the end of a run.

use tracing::info;

/// Accumulates every diagnostic line of one run.
///
/// Each line is also emitted through `tracing` as it is recorded, so console
/// output and the report channel see the same text.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one line.
    pub fn line(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "paylink::run", "{message}");
        self.lines.push(message);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_lines_in_order() {
        let mut log = RunLog::new();
        assert!(log.is_empty());
        log.line("first");
        log.line(format!("second {}", 2));
        assert_eq!(log.text(), "first\nsecond 2");
        assert_eq!(log.lines().len(), 2);
    }
}

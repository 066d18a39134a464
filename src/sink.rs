//! Log sinks injected into the runner and token refresh
//!
//! [`TracingSink`] is what the binary uses. [`RecordingSink`] keeps every
//! line in memory so callers can inspect what a run reported.

use std::sync::Mutex;
use tracing::{error, info};

/// Destination for run-level log lines
pub trait LogSink: Send + Sync {
    /// Informational line (progress, files written)
    fn info(&self, message: &str);

    /// Failure line (request, refresh or file write failures)
    fn error(&self, message: &str);
}

/// Forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// Severity of a recorded line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// From [`LogSink::info`]
    Info,
    /// From [`LogSink::error`]
    Error,
}

/// Keeps lines in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded line
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Recorded lines at the given level
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((level, message.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

//! Host log forwarding.
//!
//! `core-runtime` installs a tracing layer that turns every event surviving
//! the filter into a [`LogEntry`] and hands it to the configured
//! [`LoggerSink`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::Result;

/// Severity of a forwarded event, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// One tracing event as seen by the host.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Module path of the emitting code, e.g. `core_selector::selector`.
    pub target: String,
    pub message: String,
    /// Recorded event fields such as `key` or `direction`, rendered with `Debug`.
    pub fields: HashMap<String, String>,
    /// Name of the innermost span, usually the selector operation.
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Receiver of forwarded log entries (OSLog, Logcat, a file, a collector).
///
/// ```ignore
/// use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};
///
/// struct Stderr;
///
/// #[async_trait::async_trait]
/// impl LoggerSink for Stderr {
///     async fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
///         eprintln!("{:?} {}: {}", entry.level, entry.target, entry.message);
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Entries below this level are dropped before reaching [`log`](Self::log).
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Collecting(Mutex<Vec<LogEntry>>);

    #[async_trait::async_trait]
    impl LoggerSink for Collecting {
        async fn log(&self, entry: LogEntry) -> Result<()> {
            self.0.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[test]
    fn test_levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_entry_collects_fields() {
        let entry = LogEntry::new(LogLevel::Warn, "core_selector", "Rejected paging request")
            .with_field("key", "timeline")
            .with_field("direction", "Next");

        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.target, "core_selector");
        assert_eq!(entry.fields.get("key").map(String::as_str), Some("timeline"));
        assert_eq!(entry.fields.len(), 2);
        assert!(entry.span.is_none());
    }

    #[tokio::test]
    async fn test_default_min_level_is_info() {
        let sink = Collecting(Mutex::new(Vec::new()));
        assert_eq!(sink.min_level(), LogLevel::Info);

        sink.log(LogEntry::new(LogLevel::Info, "core_service", "ready"))
            .await
            .unwrap();
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }
}

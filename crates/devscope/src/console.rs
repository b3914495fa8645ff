//! The logging surface a scope writes through.
//!
//! A [`ConsoleSink`] stands in for the host's four logging entry points.
//! The scope decorates each call and forwards the finished line to the sink
//! for the matching category; nothing global is replaced.

use crate::color::Tone;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

// =============================================================================
// Log Category
// =============================================================================

/// Which entry point a log call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Log,
    Error,
    Warn,
    Info,
}

impl LogCategory {
    /// All categories in declaration order.
    pub const ALL: [LogCategory; 4] = [
        LogCategory::Log,
        LogCategory::Error,
        LogCategory::Warn,
        LogCategory::Info,
    ];

    /// Lowercase name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Log => "log",
            LogCategory::Error => "error",
            LogCategory::Warn => "warn",
            LogCategory::Info => "info",
        }
    }

    /// Tone used for the prefix of lines in this category.
    pub fn tone(&self) -> Tone {
        match self {
            LogCategory::Log => Tone::Neutral,
            LogCategory::Error => Tone::Red,
            LogCategory::Warn => Tone::Yellow,
            LogCategory::Info => Tone::Cyan,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Log Entry
// =============================================================================

/// One recorded log call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Entry point used
    pub category: LogCategory,
    /// Wall-clock time of the call
    pub timestamp: String,
    /// Where the call came from (best effort)
    pub call_site: String,
    /// Display renderings of the arguments, in order
    pub args: Vec<String>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(
        category: LogCategory,
        timestamp: impl Into<String>,
        call_site: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            category,
            timestamp: timestamp.into(),
            call_site: call_site.into(),
            args,
        }
    }

    /// Arguments joined with single spaces.
    pub fn message(&self) -> String {
        self.args.join(" ")
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// The four logging entry points of a host.
pub trait ConsoleSink: Send + Sync {
    /// Ordinary output.
    fn log(&self, line: &str);

    /// Error output.
    fn error(&self, line: &str);

    /// Warning output.
    fn warn(&self, line: &str);

    /// Informational output.
    fn info(&self, line: &str);

    /// Dispatch `line` to the entry point for `category`.
    fn write(&self, category: LogCategory, line: &str) {
        match category {
            LogCategory::Log => self.log(line),
            LogCategory::Error => self.error(line),
            LogCategory::Warn => self.warn(line),
            LogCategory::Info => self.info(line),
        }
    }
}

/// Writes `log`/`info` to stdout and `warn`/`error` to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl ConsoleSink for StdConsole {
    fn log(&self, line: &str) {
        println!("{line}");
    }

    fn error(&self, line: &str) {
        eprintln!("{line}");
    }

    fn warn(&self, line: &str) {
        eprintln!("{line}");
    }

    fn info(&self, line: &str) {
        println!("{line}");
    }
}

/// Forwards every line as a `tracing` event.
///
/// `log` and `info` become INFO events. Pair with
/// [`ScopeConfig::with_colorize(false)`](crate::ScopeConfig::with_colorize)
/// when the subscriber writes to a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn log(&self, line: &str) {
        tracing::info!(target: "devscope::console", "{line}");
    }

    fn error(&self, line: &str) {
        tracing::error!(target: "devscope::console", "{line}");
    }

    fn warn(&self, line: &str) {
        tracing::warn!(target: "devscope::console", "{line}");
    }

    fn info(&self, line: &str) {
        tracing::info!(target: "devscope::console", "{line}");
    }
}

/// Captures lines in memory.
///
/// Clones share the buffer, so a test can hand one clone to the scope and
/// read what was written through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(LogCategory, String)>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn lines(&self) -> Vec<(LogCategory, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Lines written to one entry point.
    pub fn lines_for(&self, category: LogCategory) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, line)| line)
            .collect()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<(LogCategory, String)> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, category: LogCategory, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((category, line.to_string()));
    }
}

impl ConsoleSink for MemorySink {
    fn log(&self, line: &str) {
        self.push(LogCategory::Log, line);
    }

    fn error(&self, line: &str) {
        self.push(LogCategory::Error, line);
    }

    fn warn(&self, line: &str) {
        self.push(LogCategory::Warn, line);
    }

    fn info(&self, line: &str) {
        self.push(LogCategory::Info, line);
    }
}

// =============================================================================
// Macros
// =============================================================================

/// Log through a scope's `log` entry point with any `Display` arguments.
///
/// ```rust
/// use devscope::{scope_log, DevScope, MemorySink};
///
/// let scope = DevScope::builder().sink(MemorySink::new()).build();
/// scope_log!(scope, "loaded", 3, "files");
/// assert_eq!(scope.stats().total_logs, 1);
/// ```
#[macro_export]
macro_rules! scope_log {
    ($scope:expr $(, $arg:expr)* $(,)?) => {
        $scope.log(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

/// Log through a scope's `error` entry point.
#[macro_export]
macro_rules! scope_error {
    ($scope:expr $(, $arg:expr)* $(,)?) => {
        $scope.error(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

/// Log through a scope's `warn` entry point.
#[macro_export]
macro_rules! scope_warn {
    ($scope:expr $(, $arg:expr)* $(,)?) => {
        $scope.warn(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

/// Log through a scope's `info` entry point.
#[macro_export]
macro_rules! scope_info {
    ($scope:expr $(, $arg:expr)* $(,)?) => {
        $scope.info(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        let names: Vec<_> = LogCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["log", "error", "warn", "info"]);
        assert_eq!(LogCategory::Warn.to_string(), "warn");
    }

    #[test]
    fn test_category_tones() {
        assert_eq!(LogCategory::Log.tone(), Tone::Neutral);
        assert_eq!(LogCategory::Error.tone(), Tone::Red);
        assert_eq!(LogCategory::Warn.tone(), Tone::Yellow);
        assert_eq!(LogCategory::Info.tone(), Tone::Cyan);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&LogCategory::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }

    #[test]
    fn test_entry_message() {
        let entry = LogEntry::new(
            LogCategory::Info,
            "00:00:00.000",
            "main.rs:1:1",
            vec!["a".to_string(), "b".to_string()],
        );
        assert_eq!(entry.message(), "a b");
    }

    #[test]
    fn test_memory_sink_routes_by_category() {
        let sink = MemorySink::new();
        let shared = sink.clone();

        sink.write(LogCategory::Log, "one");
        sink.write(LogCategory::Error, "two");
        sink.write(LogCategory::Warn, "three");
        sink.write(LogCategory::Info, "four");

        assert_eq!(shared.len(), 4);
        assert_eq!(shared.lines_for(LogCategory::Error), vec!["two".to_string()]);
        assert_eq!(shared.lines()[3], (LogCategory::Info, "four".to_string()));
    }

    #[test]
    fn test_memory_sink_take() {
        let sink = MemorySink::new();
        sink.log("x");
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }
}

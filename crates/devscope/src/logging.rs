//! Tracing subscriber setup.
//!
//! devscope emits its own diagnostics (group lifecycle, ignored ids, slow
//! calls) as `tracing` events under the `devscope` target, and
//! [`TracingSink`](crate::TracingSink) turns scope output into events too.
//! Applications that do not install a subscriber themselves can use
//! [`init_logging`].

use crate::error::{ScopeError, ScopeResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Subscriber output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line events
    #[default]
    Compact,
    /// Multi-line human-readable events
    Pretty,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output style
    pub format: LogFormat,
    /// Filter directives, e.g. `"info"` or `"devscope=trace"`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Take the filter from `RUST_LOG`, falling back to `default_filter`.
    pub fn from_env(default_filter: &str) -> Self {
        Self {
            filter: std::env::var(EnvFilter::DEFAULT_ENV)
                .unwrap_or_else(|_| default_filter.to_string()),
            ..Self::default()
        }
    }

    /// Set the output style.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install a global fmt subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> ScopeResult<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| ScopeError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|_| ScopeError::LoggingInit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LogConfig {
            filter: "devscope=notalevel".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(ScopeError::InvalidFilter(_))));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default().with_format(LogFormat::Pretty);
        let first = init_logging(&config);
        let second = init_logging(&config);

        // Another test may have installed the subscriber first; either way
        // the second attempt cannot succeed.
        assert!(first.is_ok() || matches!(first, Err(ScopeError::LoggingInit)));
        assert!(matches!(second, Err(ScopeError::LoggingInit)));
    }
}

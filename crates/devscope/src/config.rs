//! Configuration for a [`DevScope`](crate::DevScope).

use crate::error::{ScopeError, ScopeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Calls slower than this are highlighted when no threshold is configured.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(100);

/// Options controlling what a scope prints.
///
/// The configuration is fixed once the scope is built. When parsed from
/// JSON, recognized keys override the defaults and anything else is
/// ignored, so a host can hand over a larger options object unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeConfig {
    /// Include call durations in performance lines
    pub show_timings: bool,
    /// Include memory deltas in performance lines
    pub show_memory: bool,
    /// Paint prefixes and durations with ANSI colors
    pub colorize: bool,
    /// Durations above this are rendered in the warning color
    #[serde(with = "millis_serde")]
    pub slow_threshold: Duration,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            show_timings: true,
            show_memory: true,
            colorize: true,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }
}

impl ScopeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) JSON options object over the defaults.
    ///
    /// Keys are `showTimings`, `showMemory`, `colorize` and
    /// `slowThreshold` (milliseconds).
    pub fn from_json(json: &str) -> ScopeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable or disable durations in performance lines.
    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.show_timings = enabled;
        self
    }

    /// Enable or disable memory deltas in performance lines.
    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.show_memory = enabled;
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_colorize(mut self, enabled: bool) -> Self {
        self.colorize = enabled;
        self
    }

    /// Set the slow call threshold.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Set the slow call threshold in (fractional) milliseconds.
    pub fn with_slow_threshold_ms(self, millis: f64) -> ScopeResult<Self> {
        let threshold =
            millis_serde::from_millis(millis).ok_or(ScopeError::InvalidThreshold(millis))?;
        Ok(self.with_slow_threshold(threshold))
    }

    /// Whether a measured duration counts as slow.
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.slow_threshold
    }
}

// =============================================================================
// Serde helpers for Duration
// =============================================================================

mod millis_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn from_millis(millis: f64) -> Option<Duration> {
        Duration::try_from_secs_f64(millis / 1000.0).ok()
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as f64 / 1_000_000.0).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        from_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("invalid slowThreshold: {millis}")))
    }
}

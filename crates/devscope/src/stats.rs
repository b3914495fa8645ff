//! Aggregate view over recorded log entries.

use crate::console::{LogCategory, LogEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of entries reported in [`Stats::recent_logs`].
pub const RECENT_LOG_COUNT: usize = 5;

/// Counts and recent entries since the last clear.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Entries recorded since the last clear
    pub total_logs: usize,
    /// Entries per category; categories without entries are absent
    pub by_type: BTreeMap<LogCategory, usize>,
    /// Up to [`RECENT_LOG_COUNT`] newest entries, oldest first
    pub recent_logs: Vec<LogEntry>,
}

impl Stats {
    /// Summarize a chronological list of entries.
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let mut by_type = BTreeMap::new();
        for entry in entries {
            *by_type.entry(entry.category).or_insert(0) += 1;
        }

        let recent_start = entries.len().saturating_sub(RECENT_LOG_COUNT);

        Self {
            total_logs: entries.len(),
            by_type,
            recent_logs: entries[recent_start..].to_vec(),
        }
    }

    /// Count for one category (0 when absent).
    pub fn count(&self, category: LogCategory) -> usize {
        self.by_type.get(&category).copied().unwrap_or(0)
    }
}

//! Timing groups with checkpoint steps.
//!
//! A group is opened with a name, receives any number of steps, and is
//! closed into a [`GroupReport`]. Steps have no explicit start: each one
//! runs from the previous checkpoint (or the group start) to the moment it
//! is recorded, so the steps of a group always tile its timeline without
//! gaps.
//!
//! # Example
//!
//! ```rust
//! use devscope::group::GroupTimer;
//! use std::time::{Duration, Instant};
//!
//! let mut timer = GroupTimer::new();
//! let start = Instant::now();
//! let id = timer.start("import", start, 0);
//!
//! timer.add_step(&id, "parse", start + Duration::from_millis(100));
//! timer.add_step(&id, "index", start + Duration::from_millis(300));
//!
//! let report = timer.end(&id, start + Duration::from_millis(300)).unwrap();
//! assert_eq!(report.rows[0].filled, 16);
//! assert_eq!(report.rows[1].filled, 33);
//! ```

use crate::clock::{as_millis_f64, format_millis};
use crate::color::{paint, Tone, TIME_TONE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Width of a rendered bar in cells.
pub const BAR_WIDTH: usize = 50;

const FILLED_CELL: char = '█';
const EMPTY_CELL: char = '░';

// =============================================================================
// Group Id
// =============================================================================

/// Identifier of a live timing group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    /// Derive an id from the group name and the current time.
    ///
    /// A short random suffix keeps ids distinct when several groups with the
    /// same name start within the same millisecond.
    pub fn generate(name: &str, unix_millis: i64) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}-{}", name, unix_millis, &suffix[..8]))
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Steps and Groups
// =============================================================================

/// A recorded step within a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Step name
    pub name: String,
    /// Previous checkpoint
    pub start: Instant,
    /// When the step was recorded
    pub end: Instant,
}

impl Step {
    /// Time between the previous checkpoint and this step.
    pub fn duration(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// A group that has been started but not yet ended.
#[derive(Debug, Clone)]
pub struct TimingGroup {
    id: GroupId,
    name: String,
    started_at: Instant,
    steps: Vec<Step>,
}

impl TimingGroup {
    /// Create a group starting at `started_at`.
    pub fn new(id: GroupId, name: impl Into<String>, started_at: Instant) -> Self {
        Self {
            id,
            name: name.into(),
            started_at,
            steps: Vec::new(),
        }
    }

    /// Identifier handed out by [`GroupTimer::start`].
    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// Display name of the group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the group was opened.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Steps recorded so far, oldest first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// End of the last step, or the group start if there are none.
    pub fn checkpoint(&self) -> Instant {
        self.steps.last().map_or(self.started_at, |s| s.end)
    }

    /// Record a step ending at `now`.
    pub fn add_step(&mut self, name: impl Into<String>, now: Instant) {
        let start = self.checkpoint();
        self.steps.push(Step {
            name: name.into(),
            start,
            end: now.max(start),
        });
    }

    /// Close the group at `now`.
    pub fn finish(self, now: Instant) -> GroupReport {
        let total = now.saturating_duration_since(self.started_at);
        GroupReport::new(self.name, total, &self.steps)
    }
}

// =============================================================================
// Group Timer
// =============================================================================

/// Set of live timing groups keyed by id.
///
/// Operations on ids that were never issued, or whose group has already
/// ended, do nothing.
#[derive(Debug, Default)]
pub struct GroupTimer {
    groups: HashMap<GroupId, TimingGroup>,
}

impl GroupTimer {
    /// Create an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new group and return its id.
    pub fn start(&mut self, name: &str, now: Instant, unix_millis: i64) -> GroupId {
        let id = GroupId::generate(name, unix_millis);
        self.groups.insert(id.clone(), TimingGroup::new(id.clone(), name, now));
        id
    }

    /// Append a step to a live group.
    ///
    /// Returns `false` when `id` does not name a live group.
    pub fn add_step(&mut self, id: &GroupId, name: &str, now: Instant) -> bool {
        match self.groups.get_mut(id) {
            Some(group) => {
                group.add_step(name, now);
                true
            }
            None => false,
        }
    }

    /// Close a live group and produce its report.
    pub fn end(&mut self, id: &GroupId, now: Instant) -> Option<GroupReport> {
        self.groups.remove(id).map(|group| group.finish(now))
    }

    /// Look up a live group.
    pub fn get(&self, id: &GroupId) -> Option<&TimingGroup> {
        self.groups.get(id)
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no live groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop every live group without reporting.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

// =============================================================================
// Group Report
// =============================================================================

/// One step of a finished group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRow {
    /// 1-based position of the step
    pub ordinal: usize,
    pub name: String,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Share of the group total, 0 when the total is zero
    pub percent: f64,
    /// Filled cells out of [`BAR_WIDTH`]
    pub filled: usize,
}

impl StepRow {
    /// The bar for this row, `BAR_WIDTH` cells wide.
    pub fn bar(&self) -> String {
        let mut bar = String::with_capacity(BAR_WIDTH * 3);
        let filled = self.filled.min(BAR_WIDTH);
        bar.extend(std::iter::repeat(FILLED_CELL).take(filled));
        bar.extend(std::iter::repeat(EMPTY_CELL).take(BAR_WIDTH.saturating_sub(filled)));
        bar
    }
}

/// Breakdown of a finished group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    /// Group name
    pub name: String,
    /// Wall time from group start to end
    #[serde(with = "duration_serde")]
    pub total: Duration,
    /// Steps in the order they were recorded
    pub rows: Vec<StepRow>,
}

impl GroupReport {
    /// Build a report from a group's steps and total duration.
    pub fn new(name: impl Into<String>, total: Duration, steps: &[Step]) -> Self {
        let total_ms = as_millis_f64(total);
        let rows = steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let duration = step.duration();
                let percent = share_percent(as_millis_f64(duration), total_ms);
                StepRow {
                    ordinal: index + 1,
                    name: step.name.clone(),
                    duration,
                    percent,
                    filled: filled_cells(percent),
                }
            })
            .collect();

        Self {
            name: name.into(),
            total,
            rows,
        }
    }

    /// Sum of the row percentages.
    pub fn percent_sum(&self) -> f64 {
        self.rows.iter().map(|r| r.percent).sum()
    }

    /// Rendered report lines: header, one line per step, footer.
    pub fn lines(&self, colorize: bool) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(paint(&format!("📊 {}", self.name), Tone::Cyan, colorize));

        for row in &self.rows {
            lines.push(format!(
                "│{}│ {}. {} {} ({:.1}%)",
                row.bar(),
                row.ordinal,
                row.name,
                paint(&format_millis(row.duration), TIME_TONE, colorize),
                row.percent
            ));
        }

        lines.push(format!(
            "Total: {}",
            paint(&format_millis(self.total), TIME_TONE, colorize)
        ));
        lines
    }

    /// The report as a single newline-separated block.
    pub fn render(&self, colorize: bool) -> String {
        self.lines(colorize).join("\n")
    }
}

/// `part / total` as a percentage; non-finite results count as 0.
pub fn share_percent(part_ms: f64, total_ms: f64) -> f64 {
    let percent = part_ms / total_ms * 100.0;
    if percent.is_finite() {
        percent
    } else {
        0.0
    }
}

/// Bar cells for a percentage: one cell per two percent, clamped to the bar.
pub fn filled_cells(percent: f64) -> usize {
    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }
    ((percent / 2.0).floor() as usize).min(BAR_WIDTH)
}

// =============================================================================
// Serde helpers for Duration
// =============================================================================

mod duration_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        let nanos = u64::try_from(nanos).map_err(D::Error::custom)?;
        Ok(Duration::from_nanos(nanos))
    }
}

// =============================================================================
// Tests
// =============================================================================

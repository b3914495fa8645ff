//! The instrumentation facade.
//!
//! [`DevScope`] owns the recorded log and the live timing groups, and writes
//! everything it produces through an injected [`ConsoleSink`]. It is a cheap
//! handle: clones share the same state, which is what lets watched functions
//! and futures report back after the call that created them has returned.
//!
//! # Example
//!
//! ```rust
//! use devscope::{DevScope, MemorySink, ScopeConfig};
//!
//! let sink = MemorySink::new();
//! let scope = DevScope::builder()
//!     .config(ScopeConfig::default().with_colorize(false))
//!     .sink(sink.clone())
//!     .build();
//!
//! scope.info(&[&"starting", &42]);
//!
//! let id = scope.start_group("startup");
//! scope.add_step(&id, "config");
//! scope.add_step(&id, "plugins");
//! let report = scope.end_group(&id).unwrap();
//! assert_eq!(report.rows.len(), 2);
//!
//! let stats = scope.stats();
//! assert_eq!(stats.total_logs, 2);
//! ```

use crate::callsite::{CallSiteResolver, CallerLocation};
use crate::clock::{Clock, SystemClock};
use crate::color::paint;
use crate::config::ScopeConfig;
use crate::console::{ConsoleSink, LogCategory, LogEntry, StdConsole};
use crate::group::{GroupId, GroupReport, GroupTimer};
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::stats::Stats;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable bookkeeping guarded by the scope's lock.
#[derive(Debug, Default)]
struct ScopeState {
    logs: Vec<LogEntry>,
    groups: GroupTimer,
}

struct ScopeInner {
    config: ScopeConfig,
    sink: Box<dyn ConsoleSink>,
    clock: Box<dyn Clock>,
    resolver: Box<dyn CallSiteResolver>,
    memory: Box<dyn MemoryProbe>,
    state: Mutex<ScopeState>,
}

/// Developer instrumentation facade.
///
/// Every line the scope prints goes through its sink; nothing global is
/// replaced. Route log calls through the scope (directly or with the
/// `scope_*!` macros) to have them annotated and recorded.
#[derive(Clone)]
pub struct DevScope {
    inner: Arc<ScopeInner>,
}

impl fmt::Debug for DevScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("DevScope")
            .field("config", &self.inner.config)
            .field("logs", &state.logs.len())
            .field("live_groups", &state.groups.len())
            .finish()
    }
}

impl Default for DevScope {
    fn default() -> Self {
        Self::new(ScopeConfig::default())
    }
}

impl DevScope {
    /// Create a scope writing to the standard console.
    pub fn new(config: ScopeConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Start building a scope with custom collaborators.
    pub fn builder() -> DevScopeBuilder {
        DevScopeBuilder::default()
    }

    /// The configuration this scope was built with.
    pub fn config(&self) -> &ScopeConfig {
        &self.inner.config
    }

    // =========================================================================
    // Log Interceptor
    // =========================================================================

    /// Ordinary log line.
    #[track_caller]
    pub fn log(&self, args: &[&dyn fmt::Display]) {
        self.record(LogCategory::Log, Location::caller(), render_args(args));
    }

    /// Error line.
    #[track_caller]
    pub fn error(&self, args: &[&dyn fmt::Display]) {
        self.record(LogCategory::Error, Location::caller(), render_args(args));
    }

    /// Warning line.
    #[track_caller]
    pub fn warn(&self, args: &[&dyn fmt::Display]) {
        self.record(LogCategory::Warn, Location::caller(), render_args(args));
    }

    /// Informational line.
    #[track_caller]
    pub fn info(&self, args: &[&dyn fmt::Display]) {
        self.record(LogCategory::Info, Location::caller(), render_args(args));
    }

    /// Decorate, forward and record one log call.
    pub(crate) fn record(
        &self,
        category: LogCategory,
        caller: &'static Location<'static>,
        args: Vec<String>,
    ) {
        let timestamp = self.inner.clock.timestamp();
        let call_site = self.inner.resolver.resolve(caller);

        let prefix = paint(
            &format!("[{timestamp}] {call_site} →"),
            category.tone(),
            self.inner.config.colorize,
        );
        let line = if args.is_empty() {
            prefix
        } else {
            format!("{} {}", prefix, args.join(" "))
        };

        self.inner.sink.write(category, &line);
        self.state().logs.push(LogEntry::new(category, timestamp, call_site, args));
    }

    // =========================================================================
    // Group Timer
    // =========================================================================

    /// Open a timing group.
    pub fn start_group(&self, name: &str) -> GroupId {
        let now = self.inner.clock.now();
        let id = self.state().groups.start(name, now, self.inner.clock.unix_millis());
        tracing::trace!(target: "devscope", group = %id, "group started");
        id
    }

    /// Record a checkpoint step in a live group. Unknown ids are ignored.
    pub fn add_step(&self, id: &GroupId, step_name: &str) {
        let now = self.inner.clock.now();
        if !self.state().groups.add_step(id, step_name, now) {
            tracing::debug!(
                target: "devscope",
                group = %id,
                step = step_name,
                "add_step on unknown group ignored"
            );
        }
    }

    /// Close a live group, print its breakdown and return it.
    ///
    /// Returns `None`, printing nothing, when `id` is unknown or already
    /// ended.
    #[track_caller]
    pub fn end_group(&self, id: &GroupId) -> Option<GroupReport> {
        let now = self.inner.clock.now();
        let Some(report) = self.state().groups.end(id, now) else {
            tracing::debug!(target: "devscope", group = %id, "end_group on unknown group ignored");
            return None;
        };

        tracing::trace!(
            target: "devscope",
            group = %id,
            steps = report.rows.len(),
            total_ms = report.total.as_secs_f64() * 1000.0,
            "group ended"
        );

        self.record(
            LogCategory::Log,
            Location::caller(),
            vec![report.render(self.inner.config.colorize)],
        );
        Some(report)
    }

    /// Number of groups started but not yet ended.
    pub fn live_groups(&self) -> usize {
        self.state().groups.len()
    }

    // =========================================================================
    // Stats / Reset
    // =========================================================================

    /// Counts and the most recent entries since the last clear.
    pub fn stats(&self) -> Stats {
        Stats::from_entries(&self.state().logs)
    }

    /// Copy of every entry recorded since the last clear.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state().logs.clone()
    }

    /// Forget all entries and abandon live groups without reporting them.
    pub fn clear_logs(&self) {
        let mut state = self.state();
        let abandoned = state.groups.len();
        state.logs.clear();
        state.groups.clear();
        tracing::trace!(target: "devscope", abandoned_groups = abandoned, "logs cleared");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub(crate) fn memory(&self) -> &dyn MemoryProbe {
        self.inner.memory.as_ref()
    }

    /// Lock the state, recovering from poisoning: a panicking watched call
    /// must not disable the scope.
    fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render_args(args: &[&dyn fmt::Display]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`DevScope`].
///
/// Anything not set falls back to the standard console, the system clock,
/// caller locations and process memory readings.
#[derive(Default)]
pub struct DevScopeBuilder {
    config: ScopeConfig,
    sink: Option<Box<dyn ConsoleSink>>,
    clock: Option<Box<dyn Clock>>,
    resolver: Option<Box<dyn CallSiteResolver>>,
    memory: Option<Box<dyn MemoryProbe>>,
}

impl DevScopeBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: ScopeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the logging surface.
    pub fn sink(mut self, sink: impl ConsoleSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Set the time source.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Set the call-site resolver.
    pub fn resolver(mut self, resolver: impl CallSiteResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Set the memory probe.
    pub fn memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory = Some(Box::new(probe));
        self
    }

    /// Build the scope.
    pub fn build(self) -> DevScope {
        DevScope {
            inner: Arc::new(ScopeInner {
                config: self.config,
                sink: self.sink.unwrap_or_else(|| Box::new(StdConsole)),
                clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
                resolver: self.resolver.unwrap_or_else(|| Box::new(CallerLocation)),
                memory: self.memory.unwrap_or_else(|| Box::new(ProcessMemory::new())),
                state: Mutex::new(ScopeState::default()),
            }),
        }
    }
}

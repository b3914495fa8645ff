//! Developer Instrumentation
//!
//! This crate provides a small instrumentation facade for development
//! builds. A [`DevScope`] offers:
//!
//! - Annotated logging: every line gets a timestamp, a call site and a
//!   category-colored prefix, and is recorded for later inspection
//! - Call watching: wrapped functions report their arguments, duration and
//!   memory delta, while results, errors and panics pass through untouched
//! - Step breakdowns: timing groups collect checkpoint steps and print a
//!   proportional bar chart when they end
//! - Stats: per-category counts and the most recent entries
//!
//! Nothing global is patched. Output goes to an injected [`ConsoleSink`],
//! and time, memory and call-site lookups are injected the same way, so a
//! scope is fully deterministic under test.
//!
//! # Example
//!
//! ```rust
//! use devscope::{scope_info, DevScope, ScopeConfig};
//!
//! let scope = DevScope::new(ScopeConfig::default().with_colorize(false));
//!
//! scope_info!(scope, "indexing", 3, "files");
//!
//! let index = scope.watch("index", |files: usize| files * 10);
//! assert_eq!(index(3), 30);
//!
//! let id = scope.start_group("build");
//! scope.add_step(&id, "compile");
//! scope.add_step(&id, "link");
//! scope.end_group(&id);
//!
//! let stats = scope.stats();
//! assert!(stats.total_logs >= 3);
//! ```
//!
//! # Modules
//!
//! - [`scope`] - The [`DevScope`] facade and its builder
//! - [`console`] - Log categories, entries and sinks
//! - [`watch`] - Call wrappers
//! - [`group`] - Timing groups and bar-chart reports
//! - [`stats`] - Log statistics
//! - [`callsite`] - Call-site resolvers
//! - [`clock`] - Time sources
//! - [`memory`] - Memory probes
//! - [`color`] - ANSI color helpers
//! - [`config`] - Scope configuration
//! - [`logging`] - Tracing subscriber setup

pub mod callsite;
pub mod clock;
pub mod color;
pub mod config;
pub mod console;
mod error;
pub mod group;
pub mod logging;
pub mod memory;
pub mod scope;
pub mod stats;
pub mod watch;

#[cfg(feature = "backtrace-location")]
pub use callsite::BacktraceLocation;
pub use callsite::{CallSiteResolver, CallerLocation, NoLocation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ScopeConfig, DEFAULT_SLOW_THRESHOLD};
pub use console::{ConsoleSink, LogCategory, LogEntry, MemorySink, StdConsole, TracingSink};
pub use error::{ScopeError, ScopeResult};
pub use group::{GroupId, GroupReport, StepRow};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use memory::{FixedMemory, MemoryProbe, NoMemory, ProcessMemory};
pub use scope::{DevScope, DevScopeBuilder};
pub use stats::Stats;
pub use watch::WatchedFuture;

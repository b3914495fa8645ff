//! Call-site resolution.
//!
//! Resolving where a log call came from is best effort. Resolvers never
//! fail: when nothing useful is found they return [`UNKNOWN_CALL_SITE`].

use std::panic::Location;

/// Placeholder used when no call site can be determined.
pub const UNKNOWN_CALL_SITE: &str = "<unknown>";

/// Turns the location of a log call into a display string.
pub trait CallSiteResolver: Send + Sync {
    /// Describe the call site. `caller` is the `#[track_caller]` location of
    /// the logging call, which resolvers are free to ignore.
    fn resolve(&self, caller: &'static Location<'static>) -> String;
}

/// Uses the compiler-provided caller location (`file.rs:line:col`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerLocation;

impl CallSiteResolver for CallerLocation {
    fn resolve(&self, caller: &'static Location<'static>) -> String {
        short_location(caller)
    }
}

/// Always reports [`UNKNOWN_CALL_SITE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl CallSiteResolver for NoLocation {
    fn resolve(&self, _caller: &'static Location<'static>) -> String {
        UNKNOWN_CALL_SITE.to_string()
    }
}

/// Format a location with the file reduced to its last path component.
pub fn short_location(location: &Location<'_>) -> String {
    let file = location
        .file()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(location.file());
    format!("{}:{}:{}", file, location.line(), location.column())
}

// =============================================================================
// Backtrace Resolver
// =============================================================================

/// Captures a backtrace on every call and reports the first frame outside
/// this crate and the standard library.
///
/// Much slower than [`CallerLocation`] and dependent on debug info being
/// present. When a frame has no `at file:line:col` line the raw symbol is
/// reported instead.
#[cfg(feature = "backtrace-location")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceLocation;

#[cfg(feature = "backtrace-location")]
impl CallSiteResolver for BacktraceLocation {
    fn resolve(&self, _caller: &'static Location<'static>) -> String {
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        resolve_from_backtrace(&trace).unwrap_or_else(|| UNKNOWN_CALL_SITE.to_string())
    }
}

#[cfg(feature = "backtrace-location")]
const OWN_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

#[cfg(feature = "backtrace-location")]
const SKIPPED_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "__rust",
    "rust_begin_unwind",
];

#[cfg(feature = "backtrace-location")]
fn frame_patterns() -> Option<&'static (regex_lite::Regex, regex_lite::Regex)> {
    static PATTERNS: std::sync::OnceLock<Option<(regex_lite::Regex, regex_lite::Regex)>> =
        std::sync::OnceLock::new();

    PATTERNS
        .get_or_init(|| {
            let symbol = regex_lite::Regex::new(r"^\s*\d+:\s+(.+?)\s*$").ok()?;
            let location = regex_lite::Regex::new(r"^\s*at\s+(.+:\d+:\d+)\s*$").ok()?;
            Some((symbol, location))
        })
        .as_ref()
}

/// Extract the first foreign frame from a rendered std backtrace.
///
/// Returns the frame's `path:line:col` when present, otherwise the frame's
/// symbol text. Returns `None` when every frame belongs to this crate or the
/// standard library, or the text is not a backtrace at all.
#[cfg(feature = "backtrace-location")]
pub fn resolve_from_backtrace(trace: &str) -> Option<String> {
    let (symbol_re, location_re) = frame_patterns()?;
    let mut lines = trace.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(symbol) = symbol_re.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };
        let symbol = symbol.as_str();

        let location = lines
            .peek()
            .and_then(|next| location_re.captures(next))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        if is_internal_frame(symbol) {
            continue;
        }

        return Some(location.unwrap_or_else(|| symbol.to_string()));
    }

    None
}

#[cfg(feature = "backtrace-location")]
fn is_internal_frame(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    symbol.starts_with(OWN_PREFIX) || SKIPPED_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

//! Time sources.
//!
//! A scope reads two kinds of time: a monotonic [`Instant`] for measuring
//! durations and a wall-clock string for log prefixes. Both come from a
//! [`Clock`] so that tests can drive time by hand.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Human-readable wall-clock time for log prefixes.
    fn timestamp(&self) -> String;

    /// Milliseconds since the UNIX epoch, used to derive group identifiers.
    fn unix_millis(&self) -> i64;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn timestamp(&self) -> String {
        chrono::Local::now().format("%H:%M:%S%.3f").to_string()
    }

    fn unix_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the scope.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock frozen at its origin.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    /// Time elapsed since the origin.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    /// Elapsed time rendered as `HH:MM:SS.mmm`.
    fn timestamp(&self) -> String {
        let millis = self.elapsed().as_millis();
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            millis / 3_600_000,
            (millis / 60_000) % 60,
            (millis / 1000) % 60,
            millis % 1000
        )
    }

    fn unix_millis(&self) -> i64 {
        self.elapsed().as_millis() as i64
    }
}

/// Duration in fractional milliseconds.
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Duration rendered as milliseconds with two decimals (`12.34ms`).
pub fn format_millis(duration: Duration) -> String {
    format!("{:.2}ms", as_millis_f64(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_starts_frozen() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.timestamp(), "00:00:00.000");
    }

    #[test]
    fn test_manual_clock_advance_is_shared() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let before = clock.now();

        handle.advance(Duration::from_millis(1500));

        assert_eq!(clock.now() - before, Duration::from_millis(1500));
        assert_eq!(clock.timestamp(), "00:00:01.500");
        assert_eq!(clock.unix_millis(), 1500);
    }

    #[test]
    fn test_manual_clock_timestamp_hours() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3600 + 62) + Duration::from_millis(7));
        assert_eq!(clock.timestamp(), "01:01:02.007");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(Duration::from_micros(12_346)), "12.35ms");
        assert_eq!(format_millis(Duration::ZERO), "0.00ms");
        assert_eq!(as_millis_f64(Duration::from_millis(300)), 300.0);
    }

    #[test]
    fn test_system_clock_timestamp_shape() {
        let stamp = SystemClock.timestamp();
        // HH:MM:SS.mmm
        assert_eq!(stamp.len(), 12);
        assert_eq!(&stamp[2..3], ":");
        assert_eq!(&stamp[8..9], ".");
    }
}

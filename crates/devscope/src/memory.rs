//! Memory usage probes.
//!
//! Probes report the resident memory of the current process. A probe that
//! cannot measure returns `None` and the scope simply leaves memory out of
//! its performance lines.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use sysinfo::{Pid, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of process memory readings.
pub trait MemoryProbe: Send + Sync {
    /// Resident memory in bytes, if it can be measured.
    fn resident_bytes(&self) -> Option<u64>;
}

/// Signed difference between two readings, in megabytes.
pub fn delta_mb(start: u64, end: u64) -> f64 {
    (end as f64 - start as f64) / BYTES_PER_MB
}

/// Reads the resident set size of the running process.
///
/// Backed by `sysinfo`, which refreshes only the current process on each
/// reading. Reports nothing when the process cannot be inspected.
#[derive(Debug)]
pub struct ProcessMemory {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemory {
    /// Create a probe for the current process.
    pub fn new() -> Self {
        Self {
            pid: sysinfo::get_current_pid().ok(),
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemory {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|process| process.memory())
    }
}

/// Never reports a reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl MemoryProbe for NoMemory {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

/// Reports whatever value it was last set to.
///
/// Clones share the value.
#[derive(Debug, Clone, Default)]
pub struct FixedMemory {
    bytes: Arc<AtomicU64>,
}

impl FixedMemory {
    /// Create a probe reporting `bytes`.
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: Arc::new(AtomicU64::new(bytes)),
        }
    }

    /// Change the reported value.
    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::SeqCst);
    }
}

impl MemoryProbe for FixedMemory {
    fn resident_bytes(&self) -> Option<u64> {
        Some(self.bytes.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_mb_signed() {
        assert_eq!(delta_mb(0, 1024 * 1024), 1.0);
        assert_eq!(delta_mb(3 * 1024 * 1024, 1024 * 1024), -2.0);
        assert_eq!(delta_mb(5, 5), 0.0);
    }

    #[test]
    fn test_fixed_memory_shared() {
        let probe = FixedMemory::new(10);
        let handle = probe.clone();
        handle.set(42);
        assert_eq!(probe.resident_bytes(), Some(42));
    }

    #[test]
    fn test_no_memory() {
        assert_eq!(NoMemory.resident_bytes(), None);
    }

    #[test]
    fn test_process_memory_reads_something() {
        let probe = ProcessMemory::new();
        assert!(probe.resident_bytes().unwrap_or(0) > 0);
        assert!(probe.resident_bytes().is_some());
    }
}

//! Atomic counters for membrane observability.
//!
//! Counters use relaxed ordering; nothing synchronizes on them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Global membrane operation counters.
pub struct MembraneMetrics {
    /// Foreign calls made, including releases.
    pub foreign_calls: AtomicU64,
    /// Foreign calls that returned a negative status.
    pub failed_calls: AtomicU64,
    /// Status/report mismatches detected by the error channel.
    pub protocol_violations: AtomicU64,
    pub handles_acquired: AtomicU64,
    pub handles_released: AtomicU64,
    /// Native strings copied out and freed.
    pub strings_copied: AtomicU64,
    pub records_initialized: AtomicU64,
    pub records_cleared: AtomicU64,
}

impl MembraneMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            foreign_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            protocol_violations: AtomicU64::new(0),
            handles_acquired: AtomicU64::new(0),
            handles_released: AtomicU64::new(0),
            strings_copied: AtomicU64::new(0),
            records_initialized: AtomicU64::new(0),
            records_cleared: AtomicU64::new(0),
        }
    }

    /// Increment a counter by 1.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a counter value.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            foreign_calls: Self::get(&self.foreign_calls),
            failed_calls: Self::get(&self.failed_calls),
            protocol_violations: Self::get(&self.protocol_violations),
            handles_acquired: Self::get(&self.handles_acquired),
            handles_released: Self::get(&self.handles_released),
            strings_copied: Self::get(&self.strings_copied),
            records_initialized: Self::get(&self.records_initialized),
            records_cleared: Self::get(&self.records_cleared),
        }
    }
}

impl Default for MembraneMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of all membrane counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub foreign_calls: u64,
    pub failed_calls: u64,
    pub protocol_violations: u64,
    pub handles_acquired: u64,
    pub handles_released: u64,
    pub strings_copied: u64,
    pub records_initialized: u64,
    pub records_cleared: u64,
}

impl MetricsSnapshot {
    /// Handles acquired and not yet released.
    #[must_use]
    pub fn live_handles(&self) -> u64 {
        self.handles_acquired.saturating_sub(self.handles_released)
    }

    #[must_use]
    pub fn live_records(&self) -> u64 {
        self.records_initialized.saturating_sub(self.records_cleared)
    }
}

static GLOBAL_METRICS: MembraneMetrics = MembraneMetrics::new();

/// Access the global metrics singleton.
#[must_use]
pub fn global_metrics() -> &'static MembraneMetrics {
    &GLOBAL_METRICS
}

/// Handles acquired and not yet released, process-wide.
#[must_use]
pub fn live_handles() -> u64 {
    GLOBAL_METRICS.snapshot().live_handles()
}

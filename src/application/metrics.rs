//! Observability metrics for the action log.
//!
//! Counts what the action log did, for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking action log activity.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Records written by `log_action`
    actions_logged: AtomicU64,
    /// Rate-limit checks performed
    limit_checks: AtomicU64,
    /// Rate-limit checks that found a recent matching action
    limits_exceeded: AtomicU64,
    /// Records deleted by sweeps
    records_swept: AtomicU64,
    /// Tombstones written by sweeps
    tombstones_written: AtomicU64,
    /// Sweeps that stopped at their delete cap
    sweeps_capped: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_action_logged(&self) {
        self.inner.actions_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_limit_check(&self, exceeded: bool) {
        self.inner.limit_checks.fetch_add(1, Ordering::Relaxed);
        if exceeded {
            self.inner.limits_exceeded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_swept(&self) {
        self.inner.records_swept.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tombstone(&self) {
        self.inner.tombstones_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep_capped(&self) {
        self.inner.sweeps_capped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn actions_logged(&self) -> u64 {
        self.inner.actions_logged.load(Ordering::Relaxed)
    }

    pub fn limit_checks(&self) -> u64 {
        self.inner.limit_checks.load(Ordering::Relaxed)
    }

    pub fn limits_exceeded(&self) -> u64 {
        self.inner.limits_exceeded.load(Ordering::Relaxed)
    }

    pub fn records_swept(&self) -> u64 {
        self.inner.records_swept.load(Ordering::Relaxed)
    }

    pub fn tombstones_written(&self) -> u64 {
        self.inner.tombstones_written.load(Ordering::Relaxed)
    }

    pub fn sweeps_capped(&self) -> u64 {
        self.inner.sweeps_capped.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            actions_logged: self.actions_logged(),
            limit_checks: self.limit_checks(),
            limits_exceeded: self.limits_exceeded(),
            records_swept: self.records_swept(),
            tombstones_written: self.tombstones_written(),
            sweeps_capped: self.sweeps_capped(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub actions_logged: u64,
    pub limit_checks: u64,
    pub limits_exceeded: u64,
    pub records_swept: u64,
    pub tombstones_written: u64,
    pub sweeps_capped: u64,
}

impl MetricsSnapshot {
    /// Fraction of rate-limit checks that denied a repeat (0.0 to 1.0).
    ///
    /// Returns 0.0 if no checks have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.limit_checks == 0 {
            0.0
        } else {
            self.limits_exceeded as f64 / self.limit_checks as f64
        }
    }
}

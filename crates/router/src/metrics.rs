//! Destination metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single destination
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records appended
    written: AtomicU64,
    /// Append failures
    failed: AtomicU64,
    /// Records under the destination's minimum level
    below_threshold: AtomicU64,
    /// Records refused by the destination's filter
    rejected: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn inc_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn below_threshold(&self) -> u64 {
        self.below_threshold.load(Ordering::Relaxed)
    }

    pub fn inc_below_threshold(&self) {
        self.below_threshold.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            written: self.written(),
            failed: self.failed(),
            below_threshold: self.below_threshold(),
            rejected: self.rejected(),
        }
    }
}

/// Snapshot of destination metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub written: u64,
    pub failed: u64,
    pub below_threshold: u64,
    pub rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = SinkMetrics::new();
        metrics.inc_written();
        metrics.inc_written();
        metrics.inc_failed();
        metrics.inc_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.written, 2);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.below_threshold, 0);
        assert_eq!(snapshot.rejected, 1);
    }
}

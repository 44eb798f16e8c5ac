//! Selector statistics.
//!
//! Counters describing what the selectors decided, for diagnostics. They are
//! observational only and never influence selection.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Selection counters for one selector instance.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct SelectorStats {
    /// Expiry scans run.
    expiry_scans: AtomicU64,
    /// Selections that skipped the expiry scan because of the check frequency.
    expiry_scans_skipped: AtomicU64,
    /// Tables added to a result because they aged out.
    tables_aged_out: AtomicU64,
    /// Aged-out tables withheld because of dry run.
    tables_dry_run: AtomicU64,
    /// Tables removed from a result for exceeding the size cap.
    oversized_skipped: AtomicU64,
    /// Tables removed from a scan set right before streaming.
    scan_drops: AtomicU64,
}

impl SelectorStats {
    /// Creates zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_expiry_scan(&self) {
        self.expiry_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiry_scan_skipped(&self) {
        self.expiry_scans_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_aged_out(&self, count: usize) {
        self.tables_aged_out.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_dry_run(&self, count: usize) {
        self.tables_dry_run.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_oversized(&self) {
        self.oversized_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan_drops(&self, count: usize) {
        self.scan_drops.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            expiry_scans: self.expiry_scans.load(Ordering::Relaxed),
            expiry_scans_skipped: self.expiry_scans_skipped.load(Ordering::Relaxed),
            tables_aged_out: self.tables_aged_out.load(Ordering::Relaxed),
            tables_dry_run: self.tables_dry_run.load(Ordering::Relaxed),
            oversized_skipped: self.oversized_skipped.load(Ordering::Relaxed),
            scan_drops: self.scan_drops.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`SelectorStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Expiry scans run.
    pub expiry_scans: u64,
    /// Selections that skipped the expiry scan.
    pub expiry_scans_skipped: u64,
    /// Tables added because they aged out.
    pub tables_aged_out: u64,
    /// Aged-out tables withheld by dry run.
    pub tables_dry_run: u64,
    /// Tables removed for exceeding the size cap.
    pub oversized_skipped: u64,
    /// Tables removed from scan sets.
    pub scan_drops: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        assert_eq!(SelectorStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn snapshot() {
        let stats = SelectorStats::new();
        stats.record_expiry_scan();
        stats.record_expiry_scan_skipped();
        stats.record_expiry_scan_skipped();
        stats.record_aged_out(3);
        stats.record_dry_run(2);
        stats.record_oversized();
        stats.record_scan_drops(4);

        let snap = stats.snapshot();
        assert_eq!(snap.expiry_scans, 1);
        assert_eq!(snap.expiry_scans_skipped, 2);
        assert_eq!(snap.tables_aged_out, 3);
        assert_eq!(snap.tables_dry_run, 2);
        assert_eq!(snap.oversized_skipped, 1);
        assert_eq!(snap.scan_drops, 4);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(SelectorStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_oversized();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.snapshot().oversized_skipped, 800);
    }
}

//! Selector contract and per-instance mutable state.

use crate::constants::MICROS_PER_SECOND;
use agewise_window::{KeyRange, Table};
use std::sync::Arc;

/// A compaction candidate selector layered over a baseline policy.
///
/// The compaction scheduler calls [`CompactionSelector::select_candidates`]
/// repeatedly to get the next batch of tables to merge or drop. The execution
/// layer calls [`CompactionSelector::open_scanners`] right before it streams
/// a previously selected batch.
///
/// Implementations serialise both calls per instance; callers need no extra
/// locking.
pub trait CompactionSelector: Send + Sync {
    /// Stream handles returned by [`CompactionSelector::open_scanners`].
    type Scanners;

    /// Returns the next batch of tables, given the garbage-collection horizon
    /// in seconds since the epoch. Never fails; an empty batch means there
    /// is nothing to do.
    fn select_candidates(&self, gc_horizon: i32) -> Vec<Arc<Table>>;

    /// Returns the subset of `tables` that should still be streamed.
    ///
    /// The result is always a subset of the input, in input order.
    fn filter_scan_set(&self, tables: &[Arc<Table>]) -> Vec<Arc<Table>>;

    /// Filters `tables` with [`CompactionSelector::filter_scan_set`] and opens
    /// baseline scanners over what remains.
    fn open_scanners(&self, tables: &[Arc<Table>], ranges: &[KeyRange]) -> Self::Scanners;
}

/// A garbage-collection horizon in both units the selectors compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcHorizon {
    /// Horizon in seconds since the epoch, compared with local deletion times.
    pub seconds: i32,
    /// Horizon in microseconds since the epoch, compared with write timestamps.
    pub micros: i64,
}

impl GcHorizon {
    /// Converts a horizon in seconds.
    #[must_use]
    pub fn from_seconds(seconds: i32) -> Self {
        Self {
            seconds,
            micros: i64::from(seconds) * MICROS_PER_SECOND,
        }
    }
}

/// Mutable state of one selector instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorState {
    /// Wall-clock time of the last expiry scan, in milliseconds.
    pub last_expiry_check_millis: Option<i64>,
    /// The newest horizon seen so far.
    pub gc_horizon: Option<GcHorizon>,
}

impl SelectorState {
    /// Records an observed horizon. The cached horizon only moves forward.
    pub fn observe_horizon(&mut self, horizon: GcHorizon) {
        let newer = self
            .gc_horizon
            .map_or(true, |cached| horizon.micros > cached.micros);
        if newer {
            self.gc_horizon = Some(horizon);
        }
    }

    /// Returns `true` when more than `frequency_millis` have passed since the
    /// last expiry scan, or no scan has run yet.
    #[must_use]
    pub fn expiry_check_due(&self, now_millis: i64, frequency_millis: i64) -> bool {
        self.last_expiry_check_millis
            .map_or(true, |last| now_millis.saturating_sub(last) > frequency_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_converts_to_micros() {
        let horizon = GcHorizon::from_seconds(1_700);
        assert_eq!(horizon.micros, 1_700_000_000);

        let negative = GcHorizon::from_seconds(-2);
        assert_eq!(negative.micros, -2_000_000);
    }

    #[test]
    fn horizon_never_regresses() {
        let mut state = SelectorState::default();
        state.observe_horizon(GcHorizon::from_seconds(100));
        state.observe_horizon(GcHorizon::from_seconds(200));
        state.observe_horizon(GcHorizon::from_seconds(150));

        assert_eq!(state.gc_horizon, Some(GcHorizon::from_seconds(200)));
    }

    #[test]
    fn first_check_is_always_due() {
        let state = SelectorState::default();
        assert!(state.expiry_check_due(0, i64::MAX));
    }

    #[test]
    fn check_due_strictly_after_frequency() {
        let state = SelectorState {
            last_expiry_check_millis: Some(1_000),
            gc_horizon: None,
        };
        assert!(!state.expiry_check_due(1_500, 500));
        assert!(state.expiry_check_due(1_501, 500));
    }
}

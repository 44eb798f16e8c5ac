//! Size-capped selection over the baseline's own expiry detection.

use crate::error::SelectorResult;
use crate::options::ExpiryFilterOptions;
use crate::selector::{CompactionSelector, GcHorizon, SelectorState};
use crate::stats::SelectorStats;
use agewise_window::{
    Clock, KeyRange, OptionMap, SystemClock, Table, TableId, TimeWindowOptions, WindowedPolicy,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Re-implements the baseline's selection so oversized tables can be kept
/// out of merges.
///
/// Fully expired tables are always appended, whatever their size: dropping
/// a table never rewrites it.
pub struct ExpiryFilteredSelector<P> {
    base: P,
    options: ExpiryFilterOptions,
    clock: Arc<dyn Clock>,
    state: Mutex<SelectorState>,
    stats: SelectorStats,
}

impl<P: WindowedPolicy> ExpiryFilteredSelector<P> {
    /// Creates a selector over `base`, parsing `max_file_size_mb`.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_file_size_mb` is malformed or overflows.
    pub fn new(base: P, options: &OptionMap) -> SelectorResult<Self> {
        let parsed = ExpiryFilterOptions::from_map(options)?;
        Ok(Self::with_options(base, parsed))
    }

    /// Creates a selector from already parsed options.
    pub fn with_options(base: P, options: ExpiryFilterOptions) -> Self {
        info!(
            max_file_size_bytes = ?options.max_file_size_bytes,
            "expiry-filtered selector configured"
        );
        Self {
            base,
            options,
            clock: Arc::new(SystemClock),
            state: Mutex::new(SelectorState::default()),
            stats: SelectorStats::new(),
        }
    }

    /// Replaces the clock used for rate limiting.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates `max_file_size_mb` and hands the remaining keys to the
    /// baseline's validation.
    ///
    /// # Errors
    ///
    /// Returns the option error, or the baseline's validation error.
    pub fn validate_options(options: &OptionMap) -> SelectorResult<()> {
        ExpiryFilterOptions::from_map(options)?;
        TimeWindowOptions::validate(&ExpiryFilterOptions::strip(options))?;
        Ok(())
    }

    /// The parsed options.
    pub fn options(&self) -> &ExpiryFilterOptions {
        &self.options
    }

    /// The wrapped baseline.
    pub fn base(&self) -> &P {
        &self.base
    }

    /// A copy of the current mutable state.
    pub fn state(&self) -> SelectorState {
        *self.state.lock()
    }

    /// Selection counters.
    pub fn stats(&self) -> &SelectorStats {
        &self.stats
    }
}

impl<P: WindowedPolicy> CompactionSelector for ExpiryFilteredSelector<P> {
    type Scanners = P::Scanners;

    fn select_candidates(&self, gc_horizon: i32) -> Vec<Arc<Table>> {
        if self.base.live_tables().is_empty() {
            return Vec::new();
        }

        let mut state = self.state.lock();
        state.observe_horizon(GcHorizon::from_seconds(gc_horizon));

        let uncompacting = self.base.uncompacting_tables();
        let now = self.clock.now_millis();
        let frequency = self.base.expired_check_frequency_millis();
        let expired = if state.expiry_check_due(now, frequency) {
            state.last_expiry_check_millis = Some(now);
            self.stats.record_expiry_scan();
            self.base.fully_expired(&uncompacting, gc_horizon)
        } else {
            self.stats.record_expiry_scan_skipped();
            Vec::new()
        };

        let expired_ids: HashSet<TableId> = expired.iter().map(|table| table.id).collect();
        let candidates: Vec<Arc<Table>> = self
            .base
            .filter_suspect(uncompacting)
            .into_iter()
            .filter(|table| !expired_ids.contains(&table.id))
            .collect();

        let mut selected = self.base.non_expired_candidates(&candidates, gc_horizon);
        selected.retain(|table| {
            if self.options.is_oversized(table) {
                debug!(table = %table, bytes = table.size_on_disk, "skip big file");
                self.stats.record_oversized();
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            debug!(expired = expired.len(), "appending fully expired tables");
        }
        selected.extend(expired);
        selected
    }

    fn filter_scan_set(&self, tables: &[Arc<Table>]) -> Vec<Arc<Table>> {
        tables.to_vec()
    }

    fn open_scanners(&self, tables: &[Arc<Table>], ranges: &[KeyRange]) -> P::Scanners {
        self.base.open_scanners(tables, ranges)
    }
}

//! Age-based expiry on top of a time-windowed baseline.
//!
//! The [`AgingSelector`] periodically scans every live table for content
//! that is older than the configured age relative to the garbage-collection
//! horizon. Aged-out tables are returned in capped, oldest-first batches so
//! the oldest data is removed first.
//!
//! ## Invariants
//!
//! - An aged-out batch never exceeds `max_aged_tables`
//! - Dry run never changes the returned set, only logs and stats
//! - The cached horizon never moves backward
//! - Scan-set filtering only ever removes tables

use crate::constants::DEFAULT_AGE_MINUTES;
use crate::error::SelectorResult;
use crate::options::AgingOptions;
use crate::ordering::sort_oldest_first;
use crate::selector::{CompactionSelector, GcHorizon, SelectorState};
use crate::stats::SelectorStats;
use crate::timefmt::{fmt_micros, fmt_seconds};
use agewise_window::{
    Clock, KeyRange, OptionMap, SystemClock, Table, TableId, TimeWindowOptions, WindowedPolicy,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Selects aged-out tables ahead of the baseline's merge candidates.
///
/// A table is *aged out* when both hold:
///
/// - `max_timestamp + age < horizon` (in microseconds)
/// - `max_local_deletion_time >= max_local_deletion_time floor`
///
/// When a scan finds aged-out tables, the result is that batch plus any
/// baseline candidate that is itself droppable (aged out by timestamp, or
/// fully expired by local deletion time). Otherwise the result is the
/// baseline batch with oversized tables removed.
///
/// ## Example
///
/// ```rust,ignore
/// let selector = AgingSelector::new(base, &options)?.with_clock(clock);
/// let batch = selector.select_candidates(gc_horizon);
/// let scanners = selector.open_scanners(&batch, &[KeyRange::full()]);
/// ```
pub struct AgingSelector<P> {
    base: P,
    options: AgingOptions,
    clock: Arc<dyn Clock>,
    state: Mutex<SelectorState>,
    stats: SelectorStats,
}

impl<P: WindowedPolicy> AgingSelector<P> {
    /// Creates a selector over `base`, parsing the aging keys of `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if any aging option is malformed.
    pub fn new(base: P, options: &OptionMap) -> SelectorResult<Self> {
        let parsed = AgingOptions::from_map(options)?;
        Ok(Self::with_options(base, parsed))
    }

    /// Creates a selector from already parsed options.
    pub fn with_options(base: P, options: AgingOptions) -> Self {
        info!(
            options = ?options,
            check_frequency_ms = base.expired_check_frequency_millis(),
            "aging selector configured"
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

    /// Validates a full option map: the aging keys here, the rest by the
    /// time-window baseline.
    ///
    /// # Errors
    ///
    /// Returns the first malformed aging option, or the baseline's
    /// validation error for the stripped map.
    pub fn validate_options(options: &OptionMap) -> SelectorResult<()> {
        AgingOptions::from_map(options)?;
        TimeWindowOptions::validate(&AgingOptions::strip(options))?;
        Ok(())
    }

    /// The parsed options.
    pub fn options(&self) -> &AgingOptions {
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

    fn is_aged_out(&self, table: &Table, horizon_micros: i64) -> bool {
        self.options.age_micros.is_some_and(|age| {
            table.max_timestamp.saturating_add(age) < horizon_micros
                && table.max_local_deletion_time >= self.options.max_local_deletion_time
        })
    }

    fn is_droppable(&self, table: &Table, horizon: GcHorizon) -> bool {
        let aged = self
            .options
            .age_micros
            .is_some_and(|age| table.max_timestamp.saturating_add(age) < horizon.micros);
        aged || table.is_fully_expired(horizon.seconds)
    }

    /// Scans every live table and returns the capped, oldest-first batch of
    /// aged-out tables. Empty when dry run is on.
    fn scan_aged_out(&self, age_micros: i64, horizon: GcHorizon) -> Vec<Arc<Table>> {
        debug!(
            age_minutes = self.options.age_minutes.unwrap_or(DEFAULT_AGE_MINUTES),
            gc_before = %fmt_micros(horizon.micros),
            "checking aged-out tables (max_ts + age < gc_before)"
        );

        let mut aged = Vec::new();
        for table in self.base.live_tables() {
            let expires = table.max_timestamp.saturating_add(age_micros);
            debug!(
                table = %table,
                expires = %fmt_micros(expires),
                max_ts = %fmt_micros(table.max_timestamp),
                min_ttl = table.min_ttl,
                max_ttl = table.max_ttl,
                max_ldt = %fmt_seconds(i64::from(table.max_local_deletion_time)),
                "check table"
            );
            if self.is_aged_out(&table, horizon.micros) {
                debug!(
                    dry_run = self.options.dry_run,
                    table = %table,
                    expires = %fmt_micros(expires),
                    max_ts = %fmt_micros(table.max_timestamp),
                    min_ttl = table.min_ttl,
                    max_ttl = table.max_ttl,
                    max_ldt = %fmt_seconds(i64::from(table.max_local_deletion_time)),
                    "remove aged-out table"
                );
                aged.push(table);
            }
        }

        let found = aged.len();
        sort_oldest_first(&mut aged);
        aged.truncate(self.options.max_aged_tables);
        if let (Some(first), Some(last)) = (aged.first(), aged.last()) {
            debug!(
                dry_run = self.options.dry_run,
                selected = aged.len(),
                found,
                from = %fmt_micros(first.max_timestamp),
                to = %fmt_micros(last.max_timestamp),
                "aged-out tables"
            );
        }

        if self.options.dry_run {
            self.stats.record_dry_run(aged.len());
            Vec::new()
        } else {
            self.stats.record_aged_out(aged.len());
            aged
        }
    }

    fn without_oversized(&self, mut tables: Vec<Arc<Table>>) -> Vec<Arc<Table>> {
        let Some(cap) = self.options.max_file_size_bytes else {
            return tables;
        };
        tables.retain(|table| {
            if self.options.is_oversized(table) {
                debug!(table = %table, bytes = table.size_on_disk, cap, "skip big file");
                self.stats.record_oversized();
                false
            } else {
                true
            }
        });
        tables
    }
}

impl<P: WindowedPolicy> CompactionSelector for AgingSelector<P> {
    type Scanners = P::Scanners;

    fn select_candidates(&self, gc_horizon: i32) -> Vec<Arc<Table>> {
        let mut state = self.state.lock();
        let horizon = GcHorizon::from_seconds(gc_horizon);
        state.observe_horizon(horizon);

        let now = self.clock.now_millis();
        let frequency = self.base.expired_check_frequency_millis();
        let mut aged = Vec::new();
        if state.expiry_check_due(now, frequency) {
            if let Some(age_micros) = self.options.age_micros {
                aged = self.scan_aged_out(age_micros, horizon);
            }
            state.last_expiry_check_millis = Some(now);
            self.stats.record_expiry_scan();
        } else {
            self.stats.record_expiry_scan_skipped();
        }

        let baseline = self.base.baseline_select(gc_horizon);
        if aged.is_empty() {
            return self.without_oversized(baseline);
        }

        let mut seen: HashSet<TableId> = aged.iter().map(|table| table.id).collect();
        for table in baseline {
            if self.is_droppable(&table, horizon) && seen.insert(table.id) {
                aged.push(table);
            }
        }
        aged
    }

    fn filter_scan_set(&self, tables: &[Arc<Table>]) -> Vec<Arc<Table>> {
        let cached = self.state.lock().gc_horizon;
        let horizon = match cached {
            Some(horizon) if !self.options.dry_run && self.options.is_aging_enabled() => horizon,
            _ => return tables.to_vec(),
        };

        let kept: Vec<Arc<Table>> = tables
            .iter()
            .filter(|table| !self.is_aged_out(table, horizon.micros))
            .cloned()
            .collect();
        let drops = tables.len() - kept.len();
        self.stats.record_scan_drops(drops);
        debug!(
            scanners = tables.len(),
            drops,
            compact = kept.len(),
            gc_before = %fmt_micros(horizon.micros),
            "filtered scan set"
        );
        kept
    }

    fn open_scanners(&self, tables: &[Arc<Table>], ranges: &[KeyRange]) -> P::Scanners {
        let kept = self.filter_scan_set(tables);
        self.base.open_scanners(&kept, ranges)
    }
}

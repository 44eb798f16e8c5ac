//! Reference time-windowed baseline policy.

use crate::catalog::TableCatalog;
use crate::clock::{Clock, SystemClock};
use crate::options::TimeWindowOptions;
use crate::policy::{ScannerList, TableScanner, WindowedPolicy};
use crate::table::{KeyRange, Table, TableId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A time-windowed baseline over an in-memory [`TableCatalog`].
///
/// Tables are bucketed by the window holding their `max_timestamp`. Buckets
/// are examined newest first:
///
/// - the newest bucket is merged once it holds `min_threshold` tables
/// - any older bucket is merged once it holds two tables
///
/// The chosen bucket is ordered by size (smallest first) and trimmed to
/// `max_threshold`. Fully expired tables found by the rate-limited expiry
/// check are appended to every batch.
///
/// # Example
///
/// ```rust
/// use agewise_window::{InMemoryWindowPolicy, Table, TableCatalog, TableId, TimeWindowOptions, WindowedPolicy};
/// use std::sync::Arc;
///
/// let catalog = Arc::new(TableCatalog::new());
/// let day = 86_400 * 1_000_000;
/// catalog.add(Table::new(TableId::new(1), day, i32::MAX, 10));
/// catalog.add(Table::new(TableId::new(2), day + 1, i32::MAX, 10));
/// catalog.add(Table::new(TableId::new(3), 3 * day, i32::MAX, 10));
///
/// let policy = InMemoryWindowPolicy::new(catalog, TimeWindowOptions::default());
/// // The older window holds two tables, so it is merged.
/// assert_eq!(policy.baseline_select(0).len(), 2);
/// ```
#[derive(Debug)]
pub struct InMemoryWindowPolicy {
    catalog: Arc<TableCatalog>,
    options: TimeWindowOptions,
    clock: Arc<dyn Clock>,
    last_expired_check: Mutex<Option<i64>>,
}

impl InMemoryWindowPolicy {
    /// Creates a policy over `catalog` using the system clock.
    #[must_use]
    pub fn new(catalog: Arc<TableCatalog>, options: TimeWindowOptions) -> Self {
        Self {
            catalog,
            options,
            clock: Arc::new(SystemClock),
            last_expired_check: Mutex::new(None),
        }
    }

    /// Replaces the clock used for rate limiting.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The parsed options.
    #[must_use]
    pub fn options(&self) -> &TimeWindowOptions {
        &self.options
    }

    /// The underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<TableCatalog> {
        &self.catalog
    }

    /// Runs the fully-expired check if the check frequency has elapsed.
    fn rate_limited_expired(&self, tables: &[Arc<Table>], gc_horizon: i32) -> Vec<Arc<Table>> {
        let now = self.clock.now_millis();
        let mut last = self.last_expired_check.lock();
        let due = last.map_or(true, |last| {
            now.saturating_sub(last) > self.options.expired_check_frequency_millis()
        });
        if !due {
            debug!("skipping fully expired check, last check too recent");
            return Vec::new();
        }
        *last = Some(now);
        self.fully_expired(tables, gc_horizon)
    }

    fn buckets(&self, tables: &[Arc<Table>]) -> (BTreeMap<i64, Vec<Arc<Table>>>, i64) {
        let mut buckets: BTreeMap<i64, Vec<Arc<Table>>> = BTreeMap::new();
        let mut now = i64::MIN;
        for table in tables {
            let bound = self.options.window_lower_bound(table.max_timestamp);
            now = now.max(bound);
            buckets.entry(bound).or_default().push(Arc::clone(table));
        }
        (buckets, now)
    }

    fn trim_to_threshold(&self, mut bucket: Vec<Arc<Table>>) -> Vec<Arc<Table>> {
        bucket.sort_by_key(|table| table.size_on_disk);
        bucket.truncate(self.options.max_threshold);
        bucket
    }
}

impl WindowedPolicy for InMemoryWindowPolicy {
    type Scanners = ScannerList;

    fn live_tables(&self) -> Vec<Arc<Table>> {
        self.catalog.live()
    }

    fn uncompacting_tables(&self) -> Vec<Arc<Table>> {
        self.catalog.uncompacting()
    }

    fn filter_suspect(&self, tables: Vec<Arc<Table>>) -> Vec<Arc<Table>> {
        tables
            .into_iter()
            .filter(|table| !self.catalog.is_suspect(table.id))
            .collect()
    }

    fn expired_check_frequency(&self) -> Duration {
        self.options.expired_check_frequency
    }

    fn baseline_select(&self, gc_horizon: i32) -> Vec<Arc<Table>> {
        if self.catalog.is_empty() {
            return Vec::new();
        }

        let uncompacting = self.uncompacting_tables();
        let expired = self.rate_limited_expired(&uncompacting, gc_horizon);
        let expired_ids: HashSet<TableId> = expired.iter().map(|table| table.id).collect();

        let candidates: Vec<Arc<Table>> = self
            .filter_suspect(uncompacting)
            .into_iter()
            .filter(|table| !expired_ids.contains(&table.id))
            .collect();

        let mut selected = self.non_expired_candidates(&candidates, gc_horizon);
        if !expired.is_empty() {
            debug!(count = expired.len(), "including fully expired tables");
            selected.extend(expired);
        }
        selected
    }

    fn non_expired_candidates(&self, tables: &[Arc<Table>], _gc_horizon: i32) -> Vec<Arc<Table>> {
        let (buckets, now) = self.buckets(tables);
        for (bound, bucket) in buckets.into_iter().rev() {
            let eligible = if bound >= now {
                bucket.len() >= self.options.min_threshold
            } else {
                bucket.len() >= 2
            };
            if eligible {
                debug!(window = bound, tables = bucket.len(), "selected window for compaction");
                return self.trim_to_threshold(bucket);
            }
        }
        Vec::new()
    }

    fn open_scanners(&self, tables: &[Arc<Table>], ranges: &[KeyRange]) -> ScannerList {
        ScannerList::new(
            tables
                .iter()
                .map(|table| TableScanner::new(Arc::clone(table), ranges.to_vec()))
                .collect(),
        )
    }
}

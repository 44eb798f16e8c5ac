//! Table fixtures and a scripted baseline policy.
//!
//! [`ScriptedPolicy`] lets a test decide exactly what the baseline selects,
//! so selector behaviour can be checked in isolation from time-window
//! bucketing.

use agewise_window::{
    KeyRange, OptionMap, ScannerList, Table, TableCatalog, TableId, TableScanner, WindowedPolicy,
    NEVER_EXPIRES,
};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Default expiry check frequency of a [`ScriptedPolicy`].
pub const DEFAULT_SCRIPTED_FREQUENCY: Duration = Duration::from_secs(600);

/// Builder for a test [`Table`].
///
/// Defaults: timestamp 0, never expires, 1 KiB on disk.
#[derive(Debug, Clone)]
pub struct TableFixture {
    id: u64,
    max_timestamp: i64,
    max_local_deletion_time: i32,
    size_on_disk: u64,
    ttl: (i32, i32),
}

/// Starts building a table with generation `id`.
pub fn table(id: u64) -> TableFixture {
    TableFixture {
        id,
        max_timestamp: 0,
        max_local_deletion_time: NEVER_EXPIRES,
        size_on_disk: 1024,
        ttl: (0, 0),
    }
}

impl TableFixture {
    /// Sets the max write timestamp (microseconds).
    pub fn max_timestamp(mut self, micros: i64) -> Self {
        self.max_timestamp = micros;
        self
    }

    /// Sets the max local deletion time (seconds).
    pub fn deletion_time(mut self, seconds: i32) -> Self {
        self.max_local_deletion_time = seconds;
        self
    }

    /// Sets the on-disk size in bytes.
    pub fn size(mut self, bytes: u64) -> Self {
        self.size_on_disk = bytes;
        self
    }

    /// Sets the TTL bounds.
    pub fn ttl(mut self, min_ttl: i32, max_ttl: i32) -> Self {
        self.ttl = (min_ttl, max_ttl);
        self
    }

    /// Builds the table.
    pub fn build(self) -> Table {
        Table::new(
            TableId::new(self.id),
            self.max_timestamp,
            self.max_local_deletion_time,
            self.size_on_disk,
        )
        .with_ttl(self.ttl.0, self.ttl.1)
    }
}

/// Builds an option map from key/value pairs.
pub fn option_map(pairs: &[(&str, &str)]) -> OptionMap {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

/// Writes `tables` as a JSON array to a fresh temp file.
pub fn write_tables_json(tables: &[Table]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    let json = serde_json::to_vec_pretty(tables).expect("Failed to encode tables");
    file.write_all(&json).expect("Failed to write tables");
    file
}

/// A baseline whose selections are scripted by the test.
///
/// Live, compacting and suspect state comes from an owned
/// [`TableCatalog`]. The baseline batch and the time-window grouping both
/// return the scripted ids, in scripted order, restricted to the tables
/// available at the time of the call.
#[derive(Debug)]
pub struct ScriptedPolicy {
    catalog: Arc<TableCatalog>,
    baseline: Mutex<Vec<TableId>>,
    frequency: Duration,
    baseline_calls: AtomicUsize,
    last_horizon: Mutex<Option<i32>>,
}

impl ScriptedPolicy {
    /// Creates a policy over `tables` with an empty baseline.
    pub fn new(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            catalog: Arc::new(TableCatalog::with_tables(tables)),
            baseline: Mutex::new(Vec::new()),
            frequency: DEFAULT_SCRIPTED_FREQUENCY,
            baseline_calls: AtomicUsize::new(0),
            last_horizon: Mutex::new(None),
        }
    }

    /// Sets the expiry check frequency.
    pub fn with_check_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    /// Scripts the ids the baseline will return.
    pub fn set_baseline(&self, ids: &[u64]) {
        *self.baseline.lock() = ids.iter().copied().map(TableId::new).collect();
    }

    /// The backing catalog.
    pub fn catalog(&self) -> &Arc<TableCatalog> {
        &self.catalog
    }

    /// Number of [`WindowedPolicy::baseline_select`] calls so far.
    pub fn baseline_calls(&self) -> usize {
        self.baseline_calls.load(Ordering::Relaxed)
    }

    /// Horizon passed to the most recent baseline selection.
    pub fn last_baseline_horizon(&self) -> Option<i32> {
        *self.last_horizon.lock()
    }

    fn scripted_from(&self, available: &[Arc<Table>]) -> Vec<Arc<Table>> {
        self.baseline
            .lock()
            .iter()
            .filter_map(|id| available.iter().find(|table| table.id == *id).cloned())
            .collect()
    }
}

impl WindowedPolicy for ScriptedPolicy {
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
        self.frequency
    }

    fn baseline_select(&self, gc_horizon: i32) -> Vec<Arc<Table>> {
        self.baseline_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_horizon.lock() = Some(gc_horizon);
        self.scripted_from(&self.catalog.uncompacting())
    }

    fn non_expired_candidates(&self, tables: &[Arc<Table>], _gc_horizon: i32) -> Vec<Arc<Table>> {
        self.scripted_from(tables)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_defaults() {
        let table = table(7).build();
        assert_eq!(table.id, TableId::new(7));
        assert_eq!(table.max_local_deletion_time, NEVER_EXPIRES);
        assert_eq!(table.size_on_disk, 1024);
    }

    #[test]
    fn baseline_follows_script_order() {
        let policy = ScriptedPolicy::new([table(1).build(), table(2).build(), table(3).build()]);
        policy.set_baseline(&[3, 1, 9]);

        let ids: Vec<u64> = policy.baseline_select(5).iter().map(|t| t.id.as_u64()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(policy.baseline_calls(), 1);
        assert_eq!(policy.last_baseline_horizon(), Some(5));
    }

    #[test]
    fn baseline_skips_compacting() {
        let policy = ScriptedPolicy::new([table(1).build(), table(2).build()]);
        policy.set_baseline(&[1, 2]);
        assert!(policy.catalog().mark_compacting(&[TableId::new(1)]));

        let ids: Vec<u64> = policy.baseline_select(0).iter().map(|t| t.id.as_u64()).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn tables_json_is_readable() {
        let file = write_tables_json(&[table(1).size(5).build()]);
        let raw = std::fs::read_to_string(file.path()).unwrap();
        let tables: Vec<Table> = serde_json::from_str(&raw).unwrap();
        assert_eq!(tables[0].size_on_disk, 5);
    }
}

//! Baseline policy contract.

use crate::table::{KeyRange, Table};
use std::sync::Arc;
use std::time::Duration;

/// A time-windowed baseline compaction policy.
///
/// This is the collaborator the agewise selectors wrap. A baseline groups
/// live tables into merge candidates by time window and detects fully
/// expired tables; the selectors add age-based expiry and size caps on top.
///
/// # Invariants
///
/// - Returned tables are always drawn from [`WindowedPolicy::live_tables`]
/// - No method mutates a [`Table`]
/// - Implementations must be `Send + Sync`; callers serialise selection per
///   instance
///
/// # Implementors
///
/// - [`super::InMemoryWindowPolicy`] - Reference baseline over a catalog
pub trait WindowedPolicy: Send + Sync {
    /// Stream handles produced by [`WindowedPolicy::open_scanners`].
    type Scanners;

    /// Returns every live table.
    fn live_tables(&self) -> Vec<Arc<Table>>;

    /// Returns the live tables not involved in an in-flight compaction.
    fn uncompacting_tables(&self) -> Vec<Arc<Table>>;

    /// Removes tables flagged as suspect (e.g. failed checksum).
    fn filter_suspect(&self, tables: Vec<Arc<Table>>) -> Vec<Arc<Table>>;

    /// Minimum interval between fully-expired table checks.
    fn expired_check_frequency(&self) -> Duration;

    /// [`WindowedPolicy::expired_check_frequency`] in milliseconds,
    /// saturating at `i64::MAX`.
    fn expired_check_frequency_millis(&self) -> i64 {
        i64::try_from(self.expired_check_frequency().as_millis()).unwrap_or(i64::MAX)
    }

    /// Returns the next batch of tables to merge or drop.
    fn baseline_select(&self, gc_horizon: i32) -> Vec<Arc<Table>>;

    /// Returns the tables whose every cell expired before `gc_horizon`
    /// (seconds since the epoch).
    fn fully_expired(&self, tables: &[Arc<Table>], gc_horizon: i32) -> Vec<Arc<Table>> {
        tables
            .iter()
            .filter(|table| table.is_fully_expired(gc_horizon))
            .cloned()
            .collect()
    }

    /// Groups `tables` by time window and returns the next merge batch,
    /// ignoring expiry.
    fn non_expired_candidates(&self, tables: &[Arc<Table>], gc_horizon: i32) -> Vec<Arc<Table>>;

    /// Opens stream handles over `tables`, restricted to `ranges`.
    fn open_scanners(&self, tables: &[Arc<Table>], ranges: &[KeyRange]) -> Self::Scanners;
}

/// A scanner over one table restricted to a set of token ranges.
#[derive(Debug, Clone)]
pub struct TableScanner {
    table: Arc<Table>,
    ranges: Vec<KeyRange>,
}

impl TableScanner {
    /// Creates a scanner.
    #[must_use]
    pub fn new(table: Arc<Table>, ranges: Vec<KeyRange>) -> Self {
        Self { table, ranges }
    }

    /// The scanned table.
    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// The token ranges covered.
    #[must_use]
    pub fn ranges(&self) -> &[KeyRange] {
        &self.ranges
    }
}

/// The scanners opened for one merge.
#[derive(Debug, Clone, Default)]
pub struct ScannerList {
    scanners: Vec<TableScanner>,
}

impl ScannerList {
    /// Creates a list from scanners.
    #[must_use]
    pub fn new(scanners: Vec<TableScanner>) -> Self {
        Self { scanners }
    }

    /// The scanners, in input order.
    #[must_use]
    pub fn scanners(&self) -> &[TableScanner] {
        &self.scanners
    }

    /// Tables covered, in input order.
    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.scanners.iter().map(TableScanner::table)
    }

    /// Number of scanners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    /// Returns `true` if no scanners were opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

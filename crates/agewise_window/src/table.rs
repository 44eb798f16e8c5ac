//! Table metadata as seen by compaction policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Local deletion time sentinel meaning "nothing in this table ever expires".
pub const NEVER_EXPIRES: i32 = i32::MAX;

/// Stable identity of a table (its generation number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(u64);

impl TableId {
    /// Creates a table ID from a generation number.
    #[must_use]
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Returns the generation number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable sorted data file produced by a flush or a prior merge.
///
/// Only the statistics a compaction policy needs are carried here. Two
/// tables are equal when their [`TableId`]s are equal, regardless of the
/// recorded statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Identity of the table.
    pub id: TableId,
    /// File name, used for logging only.
    #[serde(default)]
    pub filename: String,
    /// Highest write timestamp contained, in the table's timestamp resolution
    /// (microseconds unless configured otherwise).
    pub max_timestamp: i64,
    /// Highest local deletion time, in seconds since the epoch.
    #[serde(default = "never_expires")]
    pub max_local_deletion_time: i32,
    /// Smallest TTL among the table's cells, in seconds.
    #[serde(default)]
    pub min_ttl: i32,
    /// Largest TTL among the table's cells, in seconds.
    #[serde(default)]
    pub max_ttl: i32,
    /// Size of the table on disk, in bytes.
    pub size_on_disk: u64,
}

fn never_expires() -> i32 {
    NEVER_EXPIRES
}

impl Table {
    /// Creates a table with the given statistics and a generated file name.
    #[must_use]
    pub fn new(
        id: TableId,
        max_timestamp: i64,
        max_local_deletion_time: i32,
        size_on_disk: u64,
    ) -> Self {
        Self {
            id,
            filename: format!("nb-{}-big-Data.db", id.as_u64()),
            max_timestamp,
            max_local_deletion_time,
            min_ttl: 0,
            max_ttl: 0,
            size_on_disk,
        }
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Sets the TTL bounds.
    #[must_use]
    pub fn with_ttl(mut self, min_ttl: i32, max_ttl: i32) -> Self {
        self.min_ttl = min_ttl;
        self.max_ttl = max_ttl;
        self
    }

    /// Returns true when every cell in the table expired before `gc_horizon`
    /// (seconds since the epoch).
    #[must_use]
    pub fn is_fully_expired(&self, gc_horizon: i32) -> bool {
        self.max_local_deletion_time < gc_horizon
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename)
    }
}

/// Inclusive range of partition tokens a scanner should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    /// First token covered.
    pub start: i64,
    /// Last token covered.
    pub end: i64,
}

impl KeyRange {
    /// Creates a token range.
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// The range covering every token.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tables_compare_by_identity() {
        let a = Table::new(TableId::new(7), 100, NEVER_EXPIRES, 10);
        let b = Table::new(TableId::new(7), 999, 5, 20);
        let c = Table::new(TableId::new(8), 100, NEVER_EXPIRES, 10);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Table> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn fully_expired_is_strict() {
        let table = Table::new(TableId::new(1), 0, 500, 0);
        assert!(table.is_fully_expired(501));
        assert!(!table.is_fully_expired(500));
        assert!(!table.is_fully_expired(499));
    }

    #[test]
    fn sentinel_never_fully_expires() {
        let table = Table::new(TableId::new(1), 0, NEVER_EXPIRES, 0);
        assert!(!table.is_fully_expired(i32::MAX));
    }

    #[test]
    fn deserialize_defaults_deletion_time_to_sentinel() {
        let json = r#"{"id": 3, "max_timestamp": 42, "size_on_disk": 1024}"#;
        let table: Table = serde_json::from_str(json).unwrap();

        assert_eq!(table.id, TableId::new(3));
        assert_eq!(table.max_local_deletion_time, NEVER_EXPIRES);
        assert_eq!(table.min_ttl, 0);
        assert!(table.filename.is_empty());
    }

    #[test]
    fn display_uses_filename() {
        let table = Table::new(TableId::new(12), 0, NEVER_EXPIRES, 0);
        assert_eq!(table.to_string(), "nb-12-big-Data.db");

        let renamed = table.with_filename("custom.db");
        assert_eq!(renamed.to_string(), "custom.db");
    }
}

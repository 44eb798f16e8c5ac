//! In-memory catalog of live tables.

use crate::table::{Table, TableId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// The live-table set of one table family, with compaction bookkeeping.
///
/// Tracks which live tables are currently being compacted and which are
/// suspect. Listing order is by [`TableId`].
///
/// # Thread Safety
///
/// The catalog is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct TableCatalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    live: BTreeMap<TableId, Arc<Table>>,
    compacting: HashSet<TableId>,
    suspect: HashSet<TableId>,
}

impl TableCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `tables`.
    #[must_use]
    pub fn with_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let catalog = Self::new();
        for table in tables {
            catalog.add(table);
        }
        catalog
    }

    /// Adds a live table, replacing any table with the same ID.
    pub fn add(&self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        self.inner.write().live.insert(table.id, Arc::clone(&table));
        table
    }

    /// Removes a table from the live set and clears its bookkeeping.
    pub fn remove(&self, id: TableId) -> Option<Arc<Table>> {
        let mut inner = self.inner.write();
        inner.compacting.remove(&id);
        inner.suspect.remove(&id);
        inner.live.remove(&id)
    }

    /// Returns the live table with `id`, if any.
    #[must_use]
    pub fn get(&self, id: TableId) -> Option<Arc<Table>> {
        self.inner.read().live.get(&id).cloned()
    }

    /// Returns every live table.
    #[must_use]
    pub fn live(&self) -> Vec<Arc<Table>> {
        self.inner.read().live.values().cloned().collect()
    }

    /// Returns live tables not marked as compacting.
    #[must_use]
    pub fn uncompacting(&self) -> Vec<Arc<Table>> {
        let inner = self.inner.read();
        inner
            .live
            .values()
            .filter(|table| !inner.compacting.contains(&table.id))
            .cloned()
            .collect()
    }

    /// Marks tables as taking part in a compaction.
    ///
    /// Returns `false`, marking nothing, if any table is not live or is
    /// already compacting.
    pub fn mark_compacting(&self, ids: &[TableId]) -> bool {
        let mut inner = self.inner.write();
        let available = ids
            .iter()
            .all(|id| inner.live.contains_key(id) && !inner.compacting.contains(id));
        if available {
            inner.compacting.extend(ids.iter().copied());
        }
        available
    }

    /// Clears the compacting mark on tables.
    pub fn unmark_compacting(&self, ids: &[TableId]) {
        let mut inner = self.inner.write();
        for id in ids {
            inner.compacting.remove(id);
        }
    }

    /// Flags a live table as suspect.
    pub fn mark_suspect(&self, id: TableId) {
        let mut inner = self.inner.write();
        if inner.live.contains_key(&id) {
            inner.suspect.insert(id);
        }
    }

    /// Returns `true` if the table is flagged as suspect.
    #[must_use]
    pub fn is_suspect(&self, id: TableId) -> bool {
        self.inner.read().suspect.contains(&id)
    }

    /// Number of live tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().live.len()
    }

    /// Returns `true` if there are no live tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().live.is_empty()
    }
}

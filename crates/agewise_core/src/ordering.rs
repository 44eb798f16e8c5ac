//! Table ordering used when batching aged-out tables.

use agewise_window::Table;
use std::cmp::Ordering;
use std::sync::Arc;

/// Orders tables by `max_timestamp`, oldest first.
///
/// Tables with equal timestamps compare as equal; no secondary key is
/// applied, so their relative order after sorting is unspecified.
#[must_use]
pub fn by_max_timestamp(a: &Table, b: &Table) -> Ordering {
    a.max_timestamp.cmp(&b.max_timestamp)
}

/// Sorts tables oldest first by [`by_max_timestamp`].
pub fn sort_oldest_first(tables: &mut [Arc<Table>]) {
    tables.sort_unstable_by(|a, b| by_max_timestamp(a, b));
}

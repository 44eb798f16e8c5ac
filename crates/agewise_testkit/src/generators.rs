//! Property-based test generators using proptest.
//!
//! Generated table sets always carry unique ids, assigned by position.

use agewise_window::{Table, TableId, NEVER_EXPIRES};
use proptest::prelude::*;

/// Microseconds per minute.
const MICROS_PER_MINUTE: i64 = 60_000_000;

/// Strategy for a max local deletion time: mostly small, sometimes the
/// never-expires sentinel.
pub fn deletion_time_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![
        3 => 0..10_000i32,
        1 => Just(NEVER_EXPIRES),
    ]
}

/// Strategy for a set of tables whose max timestamps lie within
/// `span_minutes` before `horizon_micros`.
pub fn table_set_strategy(
    horizon_micros: i64,
    span_minutes: i64,
    max_len: usize,
) -> impl Strategy<Value = Vec<Table>> {
    prop::collection::vec(
        (0..span_minutes, deletion_time_strategy(), 0..8 * 1_048_576u64),
        0..=max_len,
    )
    .prop_map(move |rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (age_minutes, ldt, size))| {
                Table::new(
                    TableId::new(index as u64 + 1),
                    horizon_micros - age_minutes * MICROS_PER_MINUTE,
                    ldt,
                    size,
                )
            })
            .collect()
    })
}

/// Strategy for a subset of `1..=len` as table generations.
pub fn id_subset_strategy(len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<bool>(), len).prop_map(|mask| {
        mask.into_iter()
            .enumerate()
            .filter(|(_, keep)| *keep)
            .map(|(index, _)| index as u64 + 1)
            .collect()
    })
}

/// Strategy for the aging option values, as raw strings:
/// `(age_minutes, max_aged_tables, max_local_deletion_time)`.
pub fn aging_values_strategy() -> impl Strategy<Value = (String, String, String)> {
    (1..600i64, 0..16usize, prop_oneof![Just(0i32), 0..5_000i32])
        .prop_map(|(age, cap, floor)| (age.to_string(), cap.to_string(), floor.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn table_ids_are_unique(tables in table_set_strategy(1_000_000_000, 60, 20)) {
            let ids: HashSet<_> = tables.iter().map(|t| t.id).collect();
            prop_assert_eq!(ids.len(), tables.len());
        }

        #[test]
        fn subsets_stay_in_range(ids in id_subset_strategy(8)) {
            prop_assert!(ids.iter().all(|id| (1..=8).contains(id)));
        }
    }
}

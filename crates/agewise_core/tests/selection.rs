//! End-to-end selection tests over scripted and in-memory baselines.

use agewise_core::constants::{
    AGE_MINUTES_KEY, DRY_RUN_KEY, MAX_AGED_TABLES_KEY, MAX_FILE_SIZE_MB_KEY,
    MAX_LOCAL_DELETION_TIME_KEY, MICROS_PER_MINUTE,
};
use agewise_core::{
    AgingOptions, AgingSelector, CompactionSelector, ExpiryFilteredSelector, GcHorizon,
};
use agewise_testkit::prelude::*;
use agewise_window::{
    InMemoryWindowPolicy, KeyRange, ManualClock, Table, TableCatalog, TableId, TimeWindowOptions,
    WindowedPolicy,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const HORIZON: i32 = 1_700_000_000;
const HORIZON_MICROS: i64 = HORIZON as i64 * 1_000_000;

fn ids(tables: &[Arc<Table>]) -> Vec<u64> {
    tables.iter().map(|t| t.id.as_u64()).collect()
}

fn aging(policy: ScriptedPolicy, pairs: &[(&str, &str)]) -> AgingSelector<ScriptedPolicy> {
    AgingSelector::new(policy, &option_map(pairs))
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(1_000_000)))
}

fn in_memory(tables: Vec<Table>, pairs: &[(&str, &str)]) -> AgingSelector<InMemoryWindowPolicy> {
    let options = option_map(pairs);
    AgingSelector::<InMemoryWindowPolicy>::validate_options(&options).unwrap();
    let clock = Arc::new(ManualClock::new(1_000_000));
    let base_options = TimeWindowOptions::from_map(&AgingOptions::strip(&options)).unwrap();
    let base = InMemoryWindowPolicy::new(Arc::new(TableCatalog::with_tables(tables)), base_options)
        .with_clock(clock.clone());
    AgingSelector::new(base, &options).unwrap().with_clock(clock)
}

#[test]
fn aged_tables_selected_over_in_memory_baseline() {
    let day = 24 * 60 * MICROS_PER_MINUTE;
    let tables = vec![
        table(1).max_timestamp(HORIZON_MICROS - 3 * day).build(),
        table(2).max_timestamp(HORIZON_MICROS - 5 * day).build(),
        table(3).max_timestamp(HORIZON_MICROS - 60 * MICROS_PER_MINUTE).build(),
    ];
    let selector = in_memory(tables, &[(AGE_MINUTES_KEY, "1440"), (DRY_RUN_KEY, "false")]);

    assert_eq!(ids(&selector.select_candidates(HORIZON)), vec![2, 1]);
}

#[test]
fn dry_run_over_in_memory_baseline_selects_nothing_extra() {
    let day = 24 * 60 * MICROS_PER_MINUTE;
    let tables = vec![
        table(1).max_timestamp(HORIZON_MICROS - 3 * day).build(),
        table(2).max_timestamp(HORIZON_MICROS - 5 * day).build(),
    ];
    let selector = in_memory(tables, &[(AGE_MINUTES_KEY, "1440")]);

    assert!(selector.select_candidates(HORIZON).is_empty());
    assert_eq!(selector.stats().snapshot().tables_dry_run, 2);
}

#[test]
fn expiry_filter_over_in_memory_baseline() {
    let options = option_map(&[(MAX_FILE_SIZE_MB_KEY, "1"), ("compaction_window_unit", "HOURS")]);
    ExpiryFilteredSelector::<InMemoryWindowPolicy>::validate_options(&options).unwrap();
    let base_options =
        TimeWindowOptions::from_map(&agewise_core::ExpiryFilterOptions::strip(&options)).unwrap();
    let catalog = Arc::new(TableCatalog::with_tables([
        table(1).size(2 * 1_048_576).build(),
        table(2).size(500 * 1024).build(),
        table(3).size(10 * 1_048_576).deletion_time(HORIZON - 10).build(),
    ]));
    let clock = Arc::new(ManualClock::new(0));
    let base = InMemoryWindowPolicy::new(catalog, base_options).with_clock(clock.clone());
    let selector = ExpiryFilteredSelector::new(base, &options).unwrap().with_clock(clock);

    let selected: HashSet<u64> = ids(&selector.select_candidates(HORIZON)).into_iter().collect();
    assert!(!selected.contains(&1));
    assert!(selected.contains(&3));
}

#[test]
fn baseline_only_union_scenario() {
    // A aged out, B not; empty baseline.
    let policy = ScriptedPolicy::new([
        table(1).max_timestamp(HORIZON_MICROS - 120 * MICROS_PER_MINUTE).deletion_time(0).build(),
        table(2).max_timestamp(HORIZON_MICROS - 10 * MICROS_PER_MINUTE).deletion_time(0).build(),
    ]);
    let selector = aging(
        policy,
        &[
            (AGE_MINUTES_KEY, "60"),
            (DRY_RUN_KEY, "false"),
            (MAX_LOCAL_DELETION_TIME_KEY, "0"),
        ],
    );

    assert_eq!(ids(&selector.select_candidates(HORIZON)), vec![1]);
}

#[test]
fn size_filter_scenario() {
    let policy = ScriptedPolicy::new([
        table(1).size(2 * 1_048_576).build(),
        table(2).size(500 * 1024).build(),
    ]);
    policy.set_baseline(&[1, 2]);
    let selector = aging(policy, &[(MAX_FILE_SIZE_MB_KEY, "1")]);

    assert_eq!(ids(&selector.select_candidates(HORIZON)), vec![2]);
}

#[test]
fn selection_is_serialised_across_threads() {
    let policy = ScriptedPolicy::new((1..=8).map(|id| {
        table(id)
            .max_timestamp(HORIZON_MICROS - (100 + id as i64) * MICROS_PER_MINUTE)
            .deletion_time(0)
            .build()
    }))
    .with_check_frequency(Duration::from_secs(3_600));
    let selector = Arc::new(aging(
        policy,
        &[
            (AGE_MINUTES_KEY, "60"),
            (DRY_RUN_KEY, "false"),
            (MAX_LOCAL_DELETION_TIME_KEY, "0"),
        ],
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let selector = Arc::clone(&selector);
            std::thread::spawn(move || selector.select_candidates(HORIZON).len())
        })
        .collect();
    let sizes: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one caller runs the scan within the frequency window.
    assert_eq!(sizes.iter().filter(|n| **n == 8).count(), 1);
    assert_eq!(sizes.iter().filter(|n| **n == 0).count(), 3);
    assert_eq!(selector.stats().snapshot().expiry_scans, 1);
}

proptest! {
    #[test]
    fn aged_batch_is_capped_and_oldest_first(
        tables in table_set_strategy(HORIZON_MICROS, 240, 24),
        cap in 0..10usize,
    ) {
        let cap_text = cap.to_string();
        let qualifying = tables
            .iter()
            .filter(|t| t.max_timestamp + 60 * MICROS_PER_MINUTE < HORIZON_MICROS)
            .count();
        let selector = aging(
            ScriptedPolicy::new(tables),
            &[
                (AGE_MINUTES_KEY, "60"),
                (DRY_RUN_KEY, "false"),
                (MAX_LOCAL_DELETION_TIME_KEY, "0"),
                (MAX_AGED_TABLES_KEY, cap_text.as_str()),
            ],
        );

        let selected = selector.select_candidates(HORIZON);
        prop_assert_eq!(selected.len(), qualifying.min(cap));
        prop_assert!(selected.windows(2).all(|w| w[0].max_timestamp <= w[1].max_timestamp));
        prop_assert!(selected
            .iter()
            .all(|t| t.max_timestamp + 60 * MICROS_PER_MINUTE < HORIZON_MICROS));
    }

    #[test]
    fn dry_run_matches_disabled_aging(
        tables in table_set_strategy(HORIZON_MICROS, 240, 16),
        baseline in id_subset_strategy(16),
        (age, cap, floor) in aging_values_strategy(),
    ) {
        let dry = ScriptedPolicy::new(tables.clone());
        dry.set_baseline(&baseline);
        let off = ScriptedPolicy::new(tables);
        off.set_baseline(&baseline);

        let dry = aging(
            dry,
            &[
                (AGE_MINUTES_KEY, age.as_str()),
                (MAX_AGED_TABLES_KEY, cap.as_str()),
                (MAX_LOCAL_DELETION_TIME_KEY, floor.as_str()),
                (MAX_FILE_SIZE_MB_KEY, "4"),
            ],
        );
        let off = aging(off, &[(MAX_FILE_SIZE_MB_KEY, "4")]);

        prop_assert_eq!(ids(&dry.select_candidates(HORIZON)), ids(&off.select_candidates(HORIZON)));
    }

    #[test]
    fn baseline_path_respects_size_cap(
        tables in table_set_strategy(HORIZON_MICROS, 240, 16),
        baseline in id_subset_strategy(16),
        cap_mb in 1..8u64,
    ) {
        let policy = ScriptedPolicy::new(tables);
        policy.set_baseline(&baseline);
        let cap_text = cap_mb.to_string();
        let selector = aging(policy, &[(MAX_FILE_SIZE_MB_KEY, cap_text.as_str())]);

        let selected = selector.select_candidates(HORIZON);
        prop_assert!(selected.iter().all(|t| t.size_on_disk <= cap_mb * 1_048_576));
    }

    #[test]
    fn scan_filter_only_removes(
        tables in table_set_strategy(HORIZON_MICROS, 240, 16),
        shift_minutes in 0..240i32,
    ) {
        let selector = aging(
            ScriptedPolicy::new(tables),
            &[
                (AGE_MINUTES_KEY, "60"),
                (DRY_RUN_KEY, "false"),
                (MAX_LOCAL_DELETION_TIME_KEY, "0"),
            ],
        );
        selector.select_candidates(HORIZON + shift_minutes * 60);

        let live = selector.base().live_tables();
        let live_ids: HashSet<TableId> = live.iter().map(|t| t.id).collect();
        let scanners = selector.open_scanners(&live, &[KeyRange::full()]);
        prop_assert!(scanners.len() <= live.len());
        prop_assert!(scanners.tables().all(|t| live_ids.contains(&t.id)));
    }

    #[test]
    fn cached_horizon_is_the_maximum(horizons in prop::collection::vec(0..i32::MAX, 1..20)) {
        let selector = aging(ScriptedPolicy::new([]), &[(AGE_MINUTES_KEY, "60")]);
        for horizon in &horizons {
            selector.select_candidates(*horizon);
        }

        let max = horizons.iter().copied().max().map(GcHorizon::from_seconds);
        prop_assert_eq!(selector.state().gc_horizon, max);
    }

    #[test]
    fn repeated_selection_within_window_skips_scan(
        tables in table_set_strategy(HORIZON_MICROS, 240, 16),
    ) {
        let selector = aging(
            ScriptedPolicy::new(tables),
            &[
                (AGE_MINUTES_KEY, "60"),
                (DRY_RUN_KEY, "false"),
                (MAX_LOCAL_DELETION_TIME_KEY, "0"),
            ],
        );
        selector.select_candidates(HORIZON);
        let checked = selector.state().last_expiry_check_millis;

        prop_assert!(selector.select_candidates(HORIZON).is_empty());
        prop_assert_eq!(selector.state().last_expiry_check_millis, checked);
    }
}

//! Option keys, defaults and unit conversions shared by the selectors.

use agewise_window::NEVER_EXPIRES;

/// Age, in minutes, after which content is eligible for expiry.
pub const AGE_MINUTES_KEY: &str = "age_minutes";
/// Cap on aged-out tables returned per selection.
pub const MAX_AGED_TABLES_KEY: &str = "max_aged_tables";
/// Floor on a table's max local deletion time for it to be aged out.
pub const MAX_LOCAL_DELETION_TIME_KEY: &str = "max_local_deletion_time";
/// Detect and log aged-out tables without selecting them.
pub const DRY_RUN_KEY: &str = "dry_run";
/// Tables larger than this many megabytes are kept out of merges.
pub const MAX_FILE_SIZE_MB_KEY: &str = "max_file_size_mb";

/// Keys owned by the aging selector.
pub const AGING_KEYS: [&str; 5] = [
    AGE_MINUTES_KEY,
    MAX_AGED_TABLES_KEY,
    MAX_LOCAL_DELETION_TIME_KEY,
    DRY_RUN_KEY,
    MAX_FILE_SIZE_MB_KEY,
];

/// Keys owned by the expiry-filtered selector.
pub const EXPIRY_FILTER_KEYS: [&str; 1] = [MAX_FILE_SIZE_MB_KEY];

/// `age_minutes` value meaning "never age out".
pub const DEFAULT_AGE_MINUTES: i64 = i64::MAX;
/// Default cap on aged-out tables per selection.
pub const DEFAULT_MAX_AGED_TABLES: usize = 32;
/// Default local deletion time floor.
pub const DEFAULT_MAX_LOCAL_DELETION_TIME: i32 = NEVER_EXPIRES;
/// Dry run is on unless explicitly disabled.
pub const DEFAULT_DRY_RUN: bool = true;

/// Bytes per megabyte for `max_file_size_mb`.
pub const BYTES_PER_MB: u64 = 1024 * 1024;
/// Microseconds per second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;
/// Microseconds per minute.
pub const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;

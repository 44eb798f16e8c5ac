//! Selector options.
//!
//! Each selector parses its own keys once, at construction, and ignores every
//! other key. The remaining keys belong to the baseline policy; use
//! [`AgingOptions::strip`] or [`ExpiryFilterOptions::strip`] to obtain the map
//! the baseline should see.

use crate::constants::{
    AGE_MINUTES_KEY, AGING_KEYS, BYTES_PER_MB, DEFAULT_AGE_MINUTES, DEFAULT_DRY_RUN,
    DEFAULT_MAX_AGED_TABLES, DEFAULT_MAX_LOCAL_DELETION_TIME, DRY_RUN_KEY, EXPIRY_FILTER_KEYS,
    MAX_AGED_TABLES_KEY, MAX_FILE_SIZE_MB_KEY, MAX_LOCAL_DELETION_TIME_KEY, MICROS_PER_MINUTE,
};
use crate::error::OptionError;
use agewise_window::{OptionMap, Table};
use serde::Serialize;
use std::str::FromStr;

/// Options of the [`crate::AgingSelector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingOptions {
    /// Age threshold in minutes, or `None` when aging is disabled.
    pub age_minutes: Option<i64>,

    /// Age threshold in microseconds, derived from `age_minutes`.
    pub age_micros: Option<i64>,

    /// Maximum aged-out tables returned per selection.
    pub max_aged_tables: usize,

    /// A table is only aged out when its max local deletion time is at or
    /// above this floor.
    pub max_local_deletion_time: i32,

    /// Detect and log aged-out tables without selecting them.
    pub dry_run: bool,

    /// Tables larger than this are kept out of baseline merges.
    pub max_file_size_bytes: Option<u64>,
}

impl Default for AgingOptions {
    fn default() -> Self {
        Self {
            age_minutes: None,
            age_micros: None,
            max_aged_tables: DEFAULT_MAX_AGED_TABLES,
            max_local_deletion_time: DEFAULT_MAX_LOCAL_DELETION_TIME,
            dry_run: DEFAULT_DRY_RUN,
            max_file_size_bytes: None,
        }
    }
}

impl AgingOptions {
    /// Parses the aging keys out of an option map.
    ///
    /// Keys this selector does not own are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if any owned key holds a malformed value.
    pub fn from_map(options: &OptionMap) -> Result<Self, OptionError> {
        let defaults = Self::default();
        let age_minutes =
            parse_number::<i64>(options, AGE_MINUTES_KEY)?.unwrap_or(DEFAULT_AGE_MINUTES);

        Ok(Self::default()
            .age_minutes(age_minutes)
            .max_aged_tables(
                parse_number(options, MAX_AGED_TABLES_KEY)?.unwrap_or(defaults.max_aged_tables),
            )
            .max_local_deletion_time(
                parse_number(options, MAX_LOCAL_DELETION_TIME_KEY)?
                    .unwrap_or(defaults.max_local_deletion_time),
            )
            .dry_run(parse_bool(options, DRY_RUN_KEY)?.unwrap_or(defaults.dry_run))
            .max_file_size(parse_file_size(options)?))
    }

    /// Returns a copy of `options` without the aging keys.
    #[must_use]
    pub fn strip(options: &OptionMap) -> OptionMap {
        strip_keys(options, &AGING_KEYS)
    }

    /// Returns `true` when an age threshold is configured.
    #[must_use]
    pub fn is_aging_enabled(&self) -> bool {
        self.age_micros.is_some()
    }

    /// Sets the age threshold. [`DEFAULT_AGE_MINUTES`] disables aging.
    #[must_use]
    pub fn age_minutes(mut self, minutes: i64) -> Self {
        if minutes == DEFAULT_AGE_MINUTES {
            self.age_minutes = None;
            self.age_micros = None;
        } else {
            self.age_minutes = Some(minutes);
            self.age_micros = Some(minutes.saturating_mul(MICROS_PER_MINUTE));
        }
        self
    }

    /// Sets the per-selection cap on aged-out tables.
    #[must_use]
    pub const fn max_aged_tables(mut self, max: usize) -> Self {
        self.max_aged_tables = max;
        self
    }

    /// Sets the local deletion time floor.
    #[must_use]
    pub const fn max_local_deletion_time(mut self, floor: i32) -> Self {
        self.max_local_deletion_time = floor;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Sets the oversized-table cap in bytes (`None` for unbounded).
    #[must_use]
    pub const fn max_file_size(mut self, bytes: Option<u64>) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    /// Returns `true` if `table` exceeds the configured size cap.
    #[must_use]
    pub fn is_oversized(&self, table: &Table) -> bool {
        exceeds(self.max_file_size_bytes, table)
    }
}

/// Options of the [`crate::ExpiryFilteredSelector`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpiryFilterOptions {
    /// Tables larger than this are kept out of merges.
    pub max_file_size_bytes: Option<u64>,
}

impl ExpiryFilterOptions {
    /// Parses `max_file_size_mb` out of an option map.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed or overflows when
    /// converted to bytes.
    pub fn from_map(options: &OptionMap) -> Result<Self, OptionError> {
        Ok(Self {
            max_file_size_bytes: parse_file_size(options)?,
        })
    }

    /// Returns a copy of `options` without `max_file_size_mb`.
    #[must_use]
    pub fn strip(options: &OptionMap) -> OptionMap {
        strip_keys(options, &EXPIRY_FILTER_KEYS)
    }

    /// Sets the oversized-table cap in bytes (`None` for unbounded).
    #[must_use]
    pub const fn max_file_size(mut self, bytes: Option<u64>) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    /// Returns `true` if `table` exceeds the configured size cap.
    #[must_use]
    pub fn is_oversized(&self, table: &Table) -> bool {
        exceeds(self.max_file_size_bytes, table)
    }
}

fn exceeds(cap: Option<u64>, table: &Table) -> bool {
    cap.is_some_and(|cap| table.size_on_disk > cap)
}

fn strip_keys(options: &OptionMap, keys: &[&str]) -> OptionMap {
    options
        .iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn parse_number<T: FromStr>(options: &OptionMap, key: &str) -> Result<Option<T>, OptionError> {
    options
        .get(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| OptionError::invalid_number(key, value))
        })
        .transpose()
}

fn parse_bool(options: &OptionMap, key: &str) -> Result<Option<bool>, OptionError> {
    options
        .get(key)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(OptionError::invalid_boolean(key, value)),
        })
        .transpose()
}

fn parse_file_size(options: &OptionMap) -> Result<Option<u64>, OptionError> {
    let Some(megabytes) = parse_number::<u64>(options, MAX_FILE_SIZE_MB_KEY)? else {
        return Ok(None);
    };
    megabytes
        .checked_mul(BYTES_PER_MB)
        .map(Some)
        .ok_or_else(|| OptionError::overflow(MAX_FILE_SIZE_MB_KEY, &megabytes.to_string()))
}

//! Time-window policy options.
//!
//! Options arrive as a string map. [`TimeWindowOptions::from_map`] parses and
//! validates every key it knows and rejects any key it does not, so wrapping
//! layers must strip their own keys before handing the map down.

use crate::error::{WindowError, WindowResult};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// String-keyed option map as supplied by table configuration.
pub type OptionMap = HashMap<String, String>;

/// Resolution of write timestamps.
pub const TIMESTAMP_RESOLUTION_KEY: &str = "timestamp_resolution";
/// Unit of the compaction window.
pub const COMPACTION_WINDOW_UNIT_KEY: &str = "compaction_window_unit";
/// Number of units per compaction window.
pub const COMPACTION_WINDOW_SIZE_KEY: &str = "compaction_window_size";
/// Seconds between fully-expired table checks.
pub const EXPIRED_CHECK_FREQUENCY_SECONDS_KEY: &str = "expired_sstable_check_frequency_seconds";
/// Minimum tables in the current window before it is merged.
pub const MIN_THRESHOLD_KEY: &str = "min_threshold";
/// Maximum tables merged in one go.
pub const MAX_THRESHOLD_KEY: &str = "max_threshold";

const DEFAULT_WINDOW_SIZE: u32 = 1;
const DEFAULT_EXPIRED_CHECK_FREQUENCY_SECONDS: u64 = 60 * 10;
const DEFAULT_MIN_THRESHOLD: usize = 4;
const DEFAULT_MAX_THRESHOLD: usize = 32;

/// Resolution of the write timestamps recorded in table metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeResolution {
    /// Seconds since the epoch.
    Seconds,
    /// Milliseconds since the epoch.
    Milliseconds,
    /// Microseconds since the epoch.
    Microseconds,
    /// Nanoseconds since the epoch.
    Nanoseconds,
}

impl TimeResolution {
    /// Parses a unit name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SECONDS" => Some(Self::Seconds),
            "MILLISECONDS" => Some(Self::Milliseconds),
            "MICROSECONDS" => Some(Self::Microseconds),
            "NANOSECONDS" => Some(Self::Nanoseconds),
            _ => None,
        }
    }

    /// Converts a timestamp in this resolution to whole seconds (floored).
    #[must_use]
    pub fn to_seconds(self, timestamp: i64) -> i64 {
        match self {
            Self::Seconds => timestamp,
            Self::Milliseconds => timestamp.div_euclid(1_000),
            Self::Microseconds => timestamp.div_euclid(1_000_000),
            Self::Nanoseconds => timestamp.div_euclid(1_000_000_000),
        }
    }
}

impl Default for TimeResolution {
    fn default() -> Self {
        Self::Microseconds
    }
}

/// Unit in which the compaction window size is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowUnit {
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl WindowUnit {
    /// Parses a unit name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MINUTES" => Some(Self::Minutes),
            "HOURS" => Some(Self::Hours),
            "DAYS" => Some(Self::Days),
            _ => None,
        }
    }

    /// Length of one unit in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 24 * 60 * 60,
        }
    }
}

impl Default for WindowUnit {
    fn default() -> Self {
        Self::Days
    }
}

/// Parsed options of the time-window baseline policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindowOptions {
    /// Resolution of table write timestamps.
    pub timestamp_resolution: TimeResolution,
    /// Unit of the compaction window.
    pub window_unit: WindowUnit,
    /// Number of units per window (at least 1).
    pub window_size: u32,
    /// Minimum interval between fully-expired table checks.
    pub expired_check_frequency: Duration,
    /// Minimum tables in the newest window before it is merged.
    pub min_threshold: usize,
    /// Maximum tables returned in one baseline batch.
    pub max_threshold: usize,
}

impl Default for TimeWindowOptions {
    fn default() -> Self {
        Self {
            timestamp_resolution: TimeResolution::default(),
            window_unit: WindowUnit::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            expired_check_frequency: Duration::from_secs(DEFAULT_EXPIRED_CHECK_FREQUENCY_SECONDS),
            min_threshold: DEFAULT_MIN_THRESHOLD,
            max_threshold: DEFAULT_MAX_THRESHOLD,
        }
    }
}

impl TimeWindowOptions {
    /// Parses and validates an option map.
    ///
    /// # Errors
    ///
    /// Returns an error if any known key holds a malformed or out-of-range
    /// value, or if the map contains keys this policy does not recognise.
    pub fn from_map(options: &OptionMap) -> WindowResult<Self> {
        let defaults = Self::default();

        let timestamp_resolution = match options.get(TIMESTAMP_RESOLUTION_KEY) {
            Some(value) => TimeResolution::from_name(value)
                .ok_or_else(|| WindowError::invalid_time_unit(TIMESTAMP_RESOLUTION_KEY, value))?,
            None => defaults.timestamp_resolution,
        };
        if timestamp_resolution != TimeResolution::default() {
            warn!(
                resolution = ?timestamp_resolution,
                "using a non-default timestamp_resolution; are writes really using non-microsecond timestamps?"
            );
        }

        let window_unit = match options.get(COMPACTION_WINDOW_UNIT_KEY) {
            Some(value) => WindowUnit::from_name(value)
                .ok_or_else(|| WindowError::invalid_time_unit(COMPACTION_WINDOW_UNIT_KEY, value))?,
            None => defaults.window_unit,
        };

        let window_size = match parse_int::<i64>(options, COMPACTION_WINDOW_SIZE_KEY)? {
            Some(size) if size < 1 => {
                return Err(WindowError::out_of_range(
                    COMPACTION_WINDOW_SIZE_KEY,
                    format!("must be at least 1, but was {size}"),
                ))
            }
            Some(size) => u32::try_from(size).map_err(|_| {
                WindowError::out_of_range(
                    COMPACTION_WINDOW_SIZE_KEY,
                    format!("{size} is too large"),
                )
            })?,
            None => defaults.window_size,
        };

        let expired_check_frequency =
            match parse_int::<i64>(options, EXPIRED_CHECK_FREQUENCY_SECONDS_KEY)? {
                Some(seconds) if seconds < 0 => {
                    return Err(WindowError::out_of_range(
                        EXPIRED_CHECK_FREQUENCY_SECONDS_KEY,
                        format!("must not be negative, but was {seconds}"),
                    ))
                }
                Some(seconds) => Duration::from_secs(seconds.unsigned_abs()),
                None => defaults.expired_check_frequency,
            };

        let min_threshold = match parse_int::<i64>(options, MIN_THRESHOLD_KEY)? {
            Some(min) if min < 2 => {
                return Err(WindowError::out_of_range(
                    MIN_THRESHOLD_KEY,
                    format!("must be at least 2, but was {min}"),
                ))
            }
            Some(min) => usize::try_from(min).map_err(|_| {
                WindowError::out_of_range(MIN_THRESHOLD_KEY, format!("{min} is too large"))
            })?,
            None => defaults.min_threshold,
        };

        let max_threshold = match parse_int::<i64>(options, MAX_THRESHOLD_KEY)? {
            Some(max) => usize::try_from(max)
                .ok()
                .filter(|max| *max >= min_threshold)
                .ok_or_else(|| {
                    WindowError::out_of_range(
                        MAX_THRESHOLD_KEY,
                        format!("must be at least {MIN_THRESHOLD_KEY} ({min_threshold}), but was {max}"),
                    )
                })?,
            None => defaults.max_threshold.max(min_threshold),
        };

        let mut unknown: Vec<String> = options
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(WindowError::UnknownOptions { keys: unknown });
        }

        Ok(Self {
            timestamp_resolution,
            window_unit,
            window_size,
            expired_check_frequency,
            min_threshold,
            max_threshold,
        })
    }

    /// Validates an option map without keeping the parsed result.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeWindowOptions::from_map`].
    pub fn validate(options: &OptionMap) -> WindowResult<()> {
        Self::from_map(options).map(|_| ())
    }

    /// Length of one compaction window in seconds.
    #[must_use]
    pub fn window_seconds(&self) -> i64 {
        self.window_unit.seconds() * i64::from(self.window_size)
    }

    /// Lower bound, in seconds, of the window holding `timestamp`.
    #[must_use]
    pub fn window_lower_bound(&self, timestamp: i64) -> i64 {
        let seconds = self.timestamp_resolution.to_seconds(timestamp);
        let window = self.window_seconds();
        seconds - seconds.rem_euclid(window)
    }

    /// Check frequency in milliseconds.
    #[must_use]
    pub fn expired_check_frequency_millis(&self) -> i64 {
        i64::try_from(self.expired_check_frequency.as_millis()).unwrap_or(i64::MAX)
    }
}

const KNOWN_KEYS: [&str; 6] = [
    TIMESTAMP_RESOLUTION_KEY,
    COMPACTION_WINDOW_UNIT_KEY,
    COMPACTION_WINDOW_SIZE_KEY,
    EXPIRED_CHECK_FREQUENCY_SECONDS_KEY,
    MIN_THRESHOLD_KEY,
    MAX_THRESHOLD_KEY,
];

fn parse_int<T: std::str::FromStr>(options: &OptionMap, key: &str) -> WindowResult<Option<T>> {
    options
        .get(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| WindowError::invalid_number(key, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_yields_defaults() {
        let options = TimeWindowOptions::from_map(&OptionMap::new()).unwrap();
        assert_eq!(options, TimeWindowOptions::default());
        assert_eq!(options.expired_check_frequency_millis(), 600_000);
        assert_eq!(options.window_seconds(), 86_400);
    }

    #[test]
    fn parses_every_key() {
        let options = TimeWindowOptions::from_map(&map(&[
            (TIMESTAMP_RESOLUTION_KEY, "MILLISECONDS"),
            (COMPACTION_WINDOW_UNIT_KEY, "hours"),
            (COMPACTION_WINDOW_SIZE_KEY, "6"),
            (EXPIRED_CHECK_FREQUENCY_SECONDS_KEY, "0"),
            (MIN_THRESHOLD_KEY, "2"),
            (MAX_THRESHOLD_KEY, "8"),
        ]))
        .unwrap();

        assert_eq!(options.timestamp_resolution, TimeResolution::Milliseconds);
        assert_eq!(options.window_unit, WindowUnit::Hours);
        assert_eq!(options.window_size, 6);
        assert_eq!(options.expired_check_frequency, Duration::ZERO);
        assert_eq!(options.min_threshold, 2);
        assert_eq!(options.max_threshold, 8);
        assert_eq!(options.window_seconds(), 6 * 3_600);
    }

    #[test]
    fn rejects_disallowed_window_unit() {
        let err = TimeWindowOptions::from_map(&map(&[(COMPACTION_WINDOW_UNIT_KEY, "SECONDS")]))
            .unwrap_err();
        assert!(matches!(err, WindowError::InvalidTimeUnit { .. }));
    }

    #[test]
    fn rejects_unknown_resolution() {
        let err = TimeWindowOptions::from_map(&map(&[(TIMESTAMP_RESOLUTION_KEY, "FORTNIGHTS")]))
            .unwrap_err();
        assert_eq!(
            err,
            WindowError::invalid_time_unit(TIMESTAMP_RESOLUTION_KEY, "FORTNIGHTS")
        );
    }

    #[test]
    fn rejects_window_size_below_one() {
        let err = TimeWindowOptions::from_map(&map(&[(COMPACTION_WINDOW_SIZE_KEY, "0")]))
            .unwrap_err();
        assert!(matches!(err, WindowError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_malformed_window_size() {
        let err = TimeWindowOptions::from_map(&map(&[(COMPACTION_WINDOW_SIZE_KEY, "one")]))
            .unwrap_err();
        assert!(matches!(err, WindowError::InvalidNumber { .. }));
    }

    #[test]
    fn rejects_negative_check_frequency() {
        let err =
            TimeWindowOptions::from_map(&map(&[(EXPIRED_CHECK_FREQUENCY_SECONDS_KEY, "-1")]))
                .unwrap_err();
        assert!(matches!(err, WindowError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_max_threshold_below_min() {
        let err = TimeWindowOptions::from_map(&map(&[
            (MIN_THRESHOLD_KEY, "8"),
            (MAX_THRESHOLD_KEY, "4"),
        ]))
        .unwrap_err();
        assert!(matches!(err, WindowError::OutOfRange { ref key, .. } if key == MAX_THRESHOLD_KEY));
    }

    #[test]
    fn rejects_unknown_keys_sorted() {
        let err = TimeWindowOptions::from_map(&map(&[("zeta", "1"), ("age_minutes", "5")]))
            .unwrap_err();
        assert_eq!(
            err,
            WindowError::UnknownOptions {
                keys: vec!["age_minutes".to_string(), "zeta".to_string()]
            }
        );
    }

    #[test]
    fn window_lower_bound_floors_to_window() {
        let options = TimeWindowOptions {
            window_unit: WindowUnit::Hours,
            ..TimeWindowOptions::default()
        };
        // 1970-01-01T02:30:00 in microseconds
        let ts = 9_000 * 1_000_000;
        assert_eq!(options.window_lower_bound(ts), 7_200);
    }

    #[test]
    fn resolution_conversion_floors_negative_timestamps() {
        assert_eq!(TimeResolution::Milliseconds.to_seconds(-1), -1);
        assert_eq!(TimeResolution::Nanoseconds.to_seconds(2_500_000_000), 2);
        assert_eq!(TimeResolution::Seconds.to_seconds(17), 17);
    }

    fn unit_strategy() -> impl Strategy<Value = WindowUnit> {
        prop_oneof![
            Just(WindowUnit::Minutes),
            Just(WindowUnit::Hours),
            Just(WindowUnit::Days),
        ]
    }

    proptest! {
        #[test]
        fn lower_bound_floors_to_window_multiple(
            micros in -4_000_000_000_000_000i64..4_000_000_000_000_000i64,
            unit in unit_strategy(),
            size in 1..64u32,
        ) {
            let options = TimeWindowOptions {
                window_unit: unit,
                window_size: size,
                ..TimeWindowOptions::default()
            };
            let window = options.window_seconds();
            let seconds = micros.div_euclid(1_000_000);
            let bound = options.window_lower_bound(micros);

            prop_assert_eq!(bound.rem_euclid(window), 0);
            prop_assert!(bound <= seconds);
            prop_assert!(seconds < bound + window);
        }
    }
}

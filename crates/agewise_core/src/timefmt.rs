//! Compact UTC timestamps for log lines.
//!
//! All helpers render as `yyyyMMdd.HHmm` in UTC. Values outside the range
//! `chrono` can represent are rendered as the argument itself, unconverted.

use chrono::DateTime;

const LOG_FORMAT: &str = "%Y%m%d.%H%M";

/// Formats a timestamp in microseconds since the epoch.
#[must_use]
pub fn fmt_micros(micros: i64) -> String {
    fmt_millis(micros.div_euclid(1_000)).unwrap_or_else(|| micros.to_string())
}

/// Formats a timestamp in seconds since the epoch.
#[must_use]
pub fn fmt_seconds(seconds: i64) -> String {
    fmt_millis(seconds.saturating_mul(1_000)).unwrap_or_else(|| seconds.to_string())
}

fn fmt_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|at| at.format(LOG_FORMAT).to_string())
}

//! Error types for baseline policy configuration.

use thiserror::Error;

/// Result type for baseline policy operations.
pub type WindowResult<T> = Result<T, WindowError>;

/// Errors raised while validating time-window policy options.
///
/// All of these surface at construction or validation time. Selection over a
/// constructed policy never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// A numeric option could not be parsed as a base-10 integer.
    #[error("{value} is not a parsable int (base10) for {key}")]
    InvalidNumber {
        /// The option key.
        key: String,
        /// The raw value supplied.
        value: String,
    },

    /// A time unit option named an unknown or disallowed unit.
    #[error("{value} is not valid for {key}")]
    InvalidTimeUnit {
        /// The option key.
        key: String,
        /// The raw value supplied.
        value: String,
    },

    /// A numeric option parsed but is outside its allowed range.
    #[error("{key} {message}")]
    OutOfRange {
        /// The option key.
        key: String,
        /// Description of the allowed range.
        message: String,
    },

    /// Options were supplied that no layer recognises.
    #[error("properties specified {keys:?} are not understood by the time-window policy")]
    UnknownOptions {
        /// The unrecognised keys, sorted.
        keys: Vec<String>,
    },
}

impl WindowError {
    /// Creates an invalid number error.
    pub fn invalid_number(key: &str, value: &str) -> Self {
        Self::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates an invalid time unit error.
    pub fn invalid_time_unit(key: &str, value: &str) -> Self {
        Self::InvalidTimeUnit {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(key: &str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

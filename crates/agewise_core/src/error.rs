//! Error types for selector construction.

use agewise_window::WindowError;
use thiserror::Error;

/// Result type for selector construction and validation.
pub type SelectorResult<T> = Result<T, SelectorError>;

/// Errors raised while parsing a selector's own options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// The value is not a valid number for this option.
    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber {
        /// The option key.
        key: String,
        /// The raw value supplied.
        value: String,
    },

    /// The value is neither `true` nor `false`.
    #[error("invalid boolean for {key}: {value:?}")]
    InvalidBoolean {
        /// The option key.
        key: String,
        /// The raw value supplied.
        value: String,
    },

    /// The value parsed but its converted form does not fit.
    #[error("value for {key} overflows: {value}")]
    Overflow {
        /// The option key.
        key: String,
        /// The raw value supplied.
        value: String,
    },
}

impl OptionError {
    /// Creates an invalid number error.
    pub fn invalid_number(key: &str, value: &str) -> Self {
        Self::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates an invalid boolean error.
    pub fn invalid_boolean(key: &str, value: &str) -> Self {
        Self::InvalidBoolean {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates an overflow error.
    pub fn overflow(key: &str, value: &str) -> Self {
        Self::Overflow {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Errors that can occur while building or validating a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// One of the selector's own options is malformed.
    #[error("option error: {0}")]
    Option(#[from] OptionError),

    /// The baseline policy rejected the remaining options.
    #[error("baseline policy error: {0}")]
    Window(#[from] WindowError),
}

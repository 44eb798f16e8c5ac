//! CLI command implementations.

pub mod plan;
pub mod validate;

use agewise_window::OptionMap;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// Which selector a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// Age-based expiry over the time-window baseline.
    Aging,
    /// Oversized-table filtering over the baseline's expiry detection.
    Expiry,
}

/// Errors raised by command argument handling.
#[derive(Debug, Error)]
pub enum CliError {
    /// An `-o` argument is not of the form `key=value`.
    #[error("option must be key=value, got {0:?}")]
    MalformedOption(String),

    /// The output format is not `text` or `json`.
    #[error("unknown output format: {0}")]
    UnknownFormat(String),
}

/// Parses repeated `key=value` arguments into an option map.
///
/// Later occurrences of a key win.
pub fn parse_options(args: &[String]) -> Result<OptionMap, CliError> {
    let mut options = OptionMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| CliError::MalformedOption(arg.clone()))?;
        options.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(options)
}

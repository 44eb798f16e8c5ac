//! Validate command implementation.

use super::SelectorKind;
use agewise_core::{AgingOptions, AgingSelector, ExpiryFilterOptions, ExpiryFilteredSelector};
use agewise_window::{InMemoryWindowPolicy, OptionMap, TimeWindowOptions};

/// Runs the validate command.
pub fn run(kind: SelectorKind, options: &OptionMap) -> Result<(), Box<dyn std::error::Error>> {
    check(kind, options)?;

    println!("Options valid for {:?} selector", kind);
    match kind {
        SelectorKind::Aging => {
            let parsed = AgingOptions::from_map(options)?;
            let base = TimeWindowOptions::from_map(&AgingOptions::strip(options))?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            println!("Baseline: {:?}", base);
        }
        SelectorKind::Expiry => {
            let parsed = ExpiryFilterOptions::from_map(options)?;
            let base = TimeWindowOptions::from_map(&ExpiryFilterOptions::strip(options))?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            println!("Baseline: {:?}", base);
        }
    }
    Ok(())
}

/// Validates `options` for the chosen selector.
pub fn check(kind: SelectorKind, options: &OptionMap) -> Result<(), agewise_core::SelectorError> {
    match kind {
        SelectorKind::Aging => AgingSelector::<InMemoryWindowPolicy>::validate_options(options),
        SelectorKind::Expiry => {
            ExpiryFilteredSelector::<InMemoryWindowPolicy>::validate_options(options)
        }
    }
}

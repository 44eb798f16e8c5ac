//! # agewise core
//!
//! Compaction candidate selection for time-ordered tables.
//!
//! This crate provides:
//! - [`AgingSelector`]: age-based expiry batches on top of a baseline policy
//! - [`ExpiryFilteredSelector`]: oversized-table filtering on top of the
//!   baseline's own fully-expired detection
//! - Option parsing for both, from the same string map the baseline reads
//! - Ordering and log-formatting helpers shared by both selectors
//!
//! Selectors only *select*. They never delete or merge tables, and they never
//! mutate table metadata.
//!
//! ## Example
//!
//! ```rust
//! use agewise_core::{AgingSelector, CompactionSelector};
//! use agewise_window::{InMemoryWindowPolicy, OptionMap, TableCatalog, TimeWindowOptions};
//! use std::sync::Arc;
//!
//! let mut options = OptionMap::new();
//! options.insert("age_minutes".into(), "1440".into());
//! options.insert("dry_run".into(), "false".into());
//!
//! AgingSelector::<InMemoryWindowPolicy>::validate_options(&options).unwrap();
//! let base_options = TimeWindowOptions::from_map(&agewise_core::AgingOptions::strip(&options)).unwrap();
//! let base = InMemoryWindowPolicy::new(Arc::new(TableCatalog::new()), base_options);
//!
//! let selector = AgingSelector::new(base, &options).unwrap();
//! assert!(selector.select_candidates(1_700_000_000).is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aging;
pub mod constants;
mod error;
mod expiry;
mod options;
pub mod ordering;
mod selector;
mod stats;
pub mod timefmt;

pub use aging::AgingSelector;
pub use error::{OptionError, SelectorError, SelectorResult};
pub use expiry::ExpiryFilteredSelector;
pub use options::{AgingOptions, ExpiryFilterOptions};
pub use selector::{CompactionSelector, GcHorizon, SelectorState};
pub use stats::{SelectorStats, StatsSnapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # agewise window
//!
//! The time-windowed baseline compaction policy that the agewise selectors
//! wrap.
//!
//! This crate provides the lowest layer of agewise. It knows about table
//! metadata and how to group tables into time windows, but nothing about
//! age-based expiry or size caps; those live in `agewise_core`.
//!
//! ## Design Principles
//!
//! - Tables are immutable and shared as `Arc<Table>`
//! - Tables compare by identity ([`TableId`]), never by content
//! - The policy contract is a trait ([`WindowedPolicy`]) so selectors hold a
//!   baseline by composition
//! - Wall-clock reads go through [`Clock`] so rate limiting is testable
//!
//! ## Available Policies
//!
//! - [`InMemoryWindowPolicy`] - Reference baseline over a [`TableCatalog`]
//!
//! ## Example
//!
//! ```rust
//! use agewise_window::{InMemoryWindowPolicy, Table, TableCatalog, TableId, TimeWindowOptions, WindowedPolicy};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(TableCatalog::new());
//! catalog.add(Table::new(TableId::new(1), 1_000_000, i32::MAX, 4096));
//! let policy = InMemoryWindowPolicy::new(catalog, TimeWindowOptions::default());
//! assert_eq!(policy.live_tables().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod clock;
mod error;
mod memory;
mod options;
mod policy;
mod table;

pub use catalog::TableCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{WindowError, WindowResult};
pub use memory::InMemoryWindowPolicy;
pub use options::{
    OptionMap, TimeResolution, TimeWindowOptions, WindowUnit, COMPACTION_WINDOW_SIZE_KEY,
    COMPACTION_WINDOW_UNIT_KEY, EXPIRED_CHECK_FREQUENCY_SECONDS_KEY, MAX_THRESHOLD_KEY,
    MIN_THRESHOLD_KEY, TIMESTAMP_RESOLUTION_KEY,
};
pub use policy::{ScannerList, TableScanner, WindowedPolicy};
pub use table::{KeyRange, Table, TableId, NEVER_EXPIRES};

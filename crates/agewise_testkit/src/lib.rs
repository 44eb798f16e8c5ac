//! # agewise testkit
//!
//! Test utilities for agewise.
//!
//! This crate provides:
//! - Table fixtures and a scripted baseline policy
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agewise_testkit::prelude::*;
//!
//! #[test]
//! fn picks_baseline() {
//!     let policy = ScriptedPolicy::new([table(1).size(10).build()]);
//!     policy.set_baseline(&[1]);
//!     // ... wrap policy in a selector
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;

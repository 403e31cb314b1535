//! # PasteDB Testkit
//!
//! Test utilities for PasteDB.
//!
//! This crate provides:
//! - Temp-directory store fixtures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use pastedb_testkit::prelude::*;
//! use pastedb_store::PasteStore;
//!
//! with_temp_store(|store| {
//!     let paste = store.create("abcde".into(), None);
//!     write_content(store, &paste, b"hello");
//! });
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

//! # anidex-core
//!
//! Core types, traits, and abstractions for the anidex catalog sync engine.
//!
//! This crate provides the canonical record model, the error taxonomy shared
//! by every subsystem, the field-level merge policy, and the trait seams for
//! the relational store, the spreadsheet service, and the metadata service.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod merge;
pub mod models;
pub mod outcome;
pub mod traits;
pub mod uuid_utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use merge::{MergePolicy, MergeRule};
pub use models::*;
pub use outcome::{ItemOutcome, SkipReason};
pub use traits::*;
pub use uuid_utils::new_system_id;

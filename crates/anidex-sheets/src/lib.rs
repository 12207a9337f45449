//! # anidex-sheets
//!
//! Spreadsheet access for anidex.
//!
//! This crate provides:
//! - [`GoogleSheetsClient`], a Sheets v4 REST implementation of
//!   [`anidex_core::SheetClient`]
//! - [`RetryExecutor`], the only place quota back-off lives
//! - [`RetryingSheetClient`], which routes every spreadsheet call through a
//!   `RetryExecutor`
//! - [`SheetWriter`], which flushes queued patches in fixed-size chunks
//! - A1-notation helpers

pub mod a1;
pub mod client;
pub mod retry;
pub mod writer;

// Re-export core types
pub use anidex_core::*;

pub use client::{GoogleSheetsClient, SheetsConfig};
pub use retry::{RetryExecutor, RetryPolicy, RetryingSheetClient};
pub use writer::{SheetWriter, WriterConfig};

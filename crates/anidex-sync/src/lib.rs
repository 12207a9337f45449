//! # anidex-sync
//!
//! Reconciliation engine between the spreadsheet and the catalog store.
//!
//! This crate provides:
//! - Row normalization with derived-field inference and write-back patches
//! - Franchise hub maintenance
//! - Field-level upsert under a [`MergePolicy`]
//! - Paced metadata enrichment
//! - [`SyncEngine`], which runs the whole pipeline, and the progress
//!   write-back operation
//!
//! ## Example
//!
//! ```ignore
//! use anidex_sync::{SyncConfig, SyncEngine};
//! use anidex_sheets::{GoogleSheetsClient, RetryExecutor, RetryPolicy, RetryingSheetClient};
//! use anidex_metadata::JikanClient;
//! use anidex_db::Database;
//!
//! let db = Database::connect("postgres://...").await?;
//! let sheets = RetryingSheetClient::new(
//!     GoogleSheetsClient::from_env()?,
//!     RetryExecutor::new(RetryPolicy::from_env()),
//! );
//! let engine = SyncEngine::new(db.anime, sheets, JikanClient::from_env()?, SyncConfig::from_env());
//!
//! let report = engine.run().await?;
//! println!("created {} updated {}", report.created, report.updated);
//! ```

pub mod enrichment;
pub mod layout;
pub mod normalizer;
pub mod pipeline;
pub mod progress;
pub mod reconciler;
pub mod series_tab;

// Re-export core types
pub use anidex_core::*;

pub use enrichment::{EnrichmentClient, EnrichmentSummary};
pub use layout::{SheetLayout, HUB_REQUIRED, PRIMARY_REQUIRED};
pub use normalizer::{normalize_rows, NormalizedBatch, NormalizedRow, RowNormalizer, SeriesFrequency};
pub use pipeline::{SyncConfig, SyncEngine};
pub use progress::update_progress;
pub use reconciler::reconcile;
pub use series_tab::{HubPlan, SeriesTabPopulator};

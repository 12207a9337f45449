//! Core traits for anidex abstractions.
//!
//! These traits define the seams to the three external collaborators: the
//! relational store, the spreadsheet service, and the metadata service.
//! Concrete implementations live in `anidex-db`, `anidex-sheets`, and
//! `anidex-metadata`; in-memory doubles live in [`crate::mock`].

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnimeEntry, EnrichmentResult, PendingPatch};
use crate::outcome::ItemOutcome;

// =============================================================================
// STORE
// =============================================================================

/// A single transactional session against the catalog store.
///
/// Writes are staged until [`EntrySession::commit`]. Dropping a session
/// without committing discards its writes.
#[async_trait]
pub trait EntrySession: Send {
    /// Find a record by its identifier.
    async fn find(&mut self, system_id: &str) -> Result<Option<AnimeEntry>>;

    /// Register a new record.
    async fn insert(&mut self, entry: &AnimeEntry) -> Result<()>;

    /// Replace every column of an existing record.
    async fn update(&mut self, entry: &AnimeEntry) -> Result<()>;

    /// Records that still need data from the metadata service.
    async fn enrichment_candidates(&mut self) -> Result<Vec<AnimeEntry>>;

    /// Commit all staged writes atomically.
    async fn commit(self) -> Result<()>;

    /// Discard all staged writes.
    async fn rollback(self) -> Result<()>;
}

/// Repository for the catalog store.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    type Session: EntrySession;

    /// Open a transactional session.
    async fn begin(&self) -> Result<Self::Session>;

    /// Fetch one record outside any session.
    async fn get(&self, system_id: &str) -> Result<Option<AnimeEntry>>;

    /// List all records ordered by English series name.
    async fn list(&self) -> Result<Vec<AnimeEntry>>;
}

// =============================================================================
// SPREADSHEET
// =============================================================================

/// Access to one spreadsheet document.
///
/// Row and column indices are 1-based, matching the spreadsheet UI.
/// Quota exhaustion must surface as [`crate::Error::QuotaExceeded`].
#[async_trait]
pub trait SheetClient: Send + Sync {
    /// Read every populated row of a tab, header row first.
    ///
    /// Rows may be shorter than the header when trailing cells are empty.
    async fn read_rows(&self, tab: &str) -> Result<Vec<Vec<String>>>;

    /// Write a batch of cells in one call.
    async fn batch_update(&self, tab: &str, patches: &[PendingPatch]) -> Result<()>;

    /// Write a single cell.
    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> Result<()>;

    /// Append rows after the last populated row.
    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<()>;
}

// =============================================================================
// METADATA
// =============================================================================

/// Read access to the external metadata service.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch enrichment data for one external id.
    ///
    /// Rate limiting and ordinary fetch failures are reported as
    /// [`ItemOutcome::Skipped`]; `Err` is reserved for failures that should
    /// abort the batch.
    async fn fetch(&self, mal_id: i32) -> Result<ItemOutcome<EnrichmentResult>>;
}

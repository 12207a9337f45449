//! In-memory doubles for the store, spreadsheet, and metadata seams.
//!
//! Enabled for this crate's tests and, through the `mock` feature, for
//! downstream test suites.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use anidex_core::mock::{MemoryEntryRepository, MemorySheet};
//!
//! let sheet = MemorySheet::new().with_tab("Anime", vec![vec!["system_id".into()]]);
//! let repo = MemoryEntryRepository::new();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{needs_enrichment, AnimeEntry, EnrichmentResult, PendingPatch};
use crate::outcome::{ItemOutcome, SkipReason};
use crate::traits::{EntryRepository, EntrySession, MetadataProvider, SheetClient};

// =============================================================================
// STORE
// =============================================================================

/// Catalog store held in memory.
#[derive(Clone, Default)]
pub struct MemoryEntryRepository {
    entries: Arc<Mutex<BTreeMap<String, AnimeEntry>>>,
    fail_writes_for: Arc<Mutex<Option<String>>>,
    failing_commits: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a committed record.
    pub fn with_entry(self, entry: AnimeEntry) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.system_id.clone(), entry);
        self
    }

    /// Make any insert or update of this identifier fail.
    pub fn fail_writes_for(&self, system_id: impl Into<String>) {
        *self.fail_writes_for.lock().unwrap() = Some(system_id.into());
    }

    /// Make the next `n` commits fail, discarding their staged writes.
    pub fn fail_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Snapshot of committed records.
    pub fn snapshot(&self) -> BTreeMap<String, AnimeEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of committed sessions.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

/// Session staging writes against a copy of the store.
pub struct MemorySession {
    staged: BTreeMap<String, AnimeEntry>,
    repo: MemoryEntryRepository,
}

impl MemorySession {
    fn check_write(&self, system_id: &str) -> Result<()> {
        match self.repo.fail_writes_for.lock().unwrap().as_deref() {
            Some(failing) if failing == system_id => Err(Error::Internal(format!(
                "simulated write failure for {}",
                system_id
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EntrySession for MemorySession {
    async fn find(&mut self, system_id: &str) -> Result<Option<AnimeEntry>> {
        Ok(self.staged.get(system_id).cloned())
    }

    async fn insert(&mut self, entry: &AnimeEntry) -> Result<()> {
        self.check_write(&entry.system_id)?;
        if self.staged.contains_key(&entry.system_id) {
            return Err(Error::InvalidInput(format!(
                "duplicate system_id {}",
                entry.system_id
            )));
        }
        self.staged.insert(entry.system_id.clone(), entry.clone());
        Ok(())
    }

    async fn update(&mut self, entry: &AnimeEntry) -> Result<()> {
        self.check_write(&entry.system_id)?;
        match self.staged.get_mut(&entry.system_id) {
            Some(slot) => {
                *slot = entry.clone();
                Ok(())
            }
            None => Err(Error::NotFound(entry.system_id.clone())),
        }
    }

    async fn enrichment_candidates(&mut self) -> Result<Vec<AnimeEntry>> {
        Ok(self
            .staged
            .values()
            .filter(|e| needs_enrichment(e))
            .cloned()
            .collect())
    }

    async fn commit(self) -> Result<()> {
        let failing = &self.repo.failing_commits;
        if failing
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Internal("simulated commit failure".into()));
        }
        *self.repo.entries.lock().unwrap() = self.staged;
        self.repo.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession> {
        Ok(MemorySession {
            staged: self.snapshot(),
            repo: self.clone(),
        })
    }

    async fn get(&self, system_id: &str) -> Result<Option<AnimeEntry>> {
        Ok(self.entries.lock().unwrap().get(system_id).cloned())
    }

    async fn list(&self) -> Result<Vec<AnimeEntry>> {
        let mut entries: Vec<AnimeEntry> = self.entries.lock().unwrap().values().cloned().collect();
        entries.sort_by(|a, b| a.series_en.cmp(&b.series_en));
        Ok(entries)
    }
}

// =============================================================================
// SPREADSHEET
// =============================================================================

/// A recorded spreadsheet call.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCall {
    Read(String),
    BatchUpdate { tab: String, cells: usize },
    UpdateCell { tab: String, row: usize, col: usize, value: String },
    Append { tab: String, rows: usize },
}

/// Spreadsheet held in memory. Writes are applied to the grid so a second
/// run observes them.
#[derive(Clone, Default)]
pub struct MemorySheet {
    tabs: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    quota_failures: Arc<Mutex<u32>>,
    calls: Arc<Mutex<Vec<SheetCall>>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tab with rows (header first).
    pub fn with_tab(self, tab: &str, rows: Vec<Vec<String>>) -> Self {
        self.tabs.lock().unwrap().insert(tab.to_string(), rows);
        self
    }

    /// Fail the next `n` calls with a quota error.
    pub fn fail_with_quota(&self, n: u32) {
        *self.quota_failures.lock().unwrap() = n;
    }

    /// Current contents of a tab.
    pub fn rows(&self, tab: &str) -> Vec<Vec<String>> {
        self.tabs
            .lock()
            .unwrap()
            .get(tab)
            .cloned()
            .unwrap_or_default()
    }

    /// Value of a 1-based cell, empty when out of range.
    pub fn cell(&self, tab: &str, row: usize, col: usize) -> String {
        self.rows(tab)
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default()
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<SheetCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: SheetCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let mut remaining = self.quota_failures.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(Error::QuotaExceeded("simulated quota".to_string()));
        }
        Ok(())
    }

    fn write(&self, tab: &str, row: usize, col: usize, value: &str) {
        let mut tabs = self.tabs.lock().unwrap();
        let grid = tabs.entry(tab.to_string()).or_default();
        if grid.len() < row {
            grid.resize(row, Vec::new());
        }
        let cells = &mut grid[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
    }
}

#[async_trait]
impl SheetClient for MemorySheet {
    async fn read_rows(&self, tab: &str) -> Result<Vec<Vec<String>>> {
        self.record(SheetCall::Read(tab.to_string()))?;
        match self.tabs.lock().unwrap().get(tab) {
            Some(rows) => Ok(rows.clone()),
            None => Err(Error::NotFound(format!("tab {}", tab))),
        }
    }

    async fn batch_update(&self, tab: &str, patches: &[PendingPatch]) -> Result<()> {
        self.record(SheetCall::BatchUpdate {
            tab: tab.to_string(),
            cells: patches.len(),
        })?;
        for patch in patches {
            self.write(tab, patch.row, patch.col, &patch.value);
        }
        Ok(())
    }

    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> Result<()> {
        self.record(SheetCall::UpdateCell {
            tab: tab.to_string(),
            row,
            col,
            value: value.to_string(),
        })?;
        self.write(tab, row, col, value);
        Ok(())
    }

    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<()> {
        self.record(SheetCall::Append {
            tab: tab.to_string(),
            rows: rows.len(),
        })?;
        let mut tabs = self.tabs.lock().unwrap();
        tabs.entry(tab.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Metadata provider answering from a fixed table.
///
/// Unknown ids are reported as fetch failures.
#[derive(Clone, Default)]
pub struct StaticMetadataProvider {
    responses: Arc<HashMap<i32, ItemOutcome<EnrichmentResult>>>,
    calls: Arc<Mutex<Vec<(i32, tokio::time::Instant)>>>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `mal_id` with the given outcome.
    pub fn with_response(mut self, mal_id: i32, outcome: ItemOutcome<EnrichmentResult>) -> Self {
        Arc::make_mut(&mut self.responses).insert(mal_id, outcome);
        self
    }

    /// Ids fetched so far with the instant of each call.
    pub fn calls(&self) -> Vec<(i32, tokio::time::Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn fetch(&self, mal_id: i32) -> Result<ItemOutcome<EnrichmentResult>> {
        self.calls
            .lock()
            .unwrap()
            .push((mal_id, tokio::time::Instant::now()));
        Ok(self.responses.get(&mal_id).cloned().unwrap_or_else(|| {
            ItemOutcome::Skipped(SkipReason::FetchFailed(format!("no data for {}", mal_id)))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_session_commit_and_rollback() {
        let repo = MemoryEntryRepository::new();
        let entry = AnimeEntry {
            system_id: "a".into(),
            ..Default::default()
        };

        let mut session = repo.begin().await.unwrap();
        session.insert(&entry).await.unwrap();
        session.rollback().await.unwrap();
        assert!(repo.get("a").await.unwrap().is_none());

        let mut session = repo.begin().await.unwrap();
        session.insert(&entry).await.unwrap();
        session.commit().await.unwrap();
        assert!(repo.get("a").await.unwrap().is_some());
        assert_eq!(repo.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_sheet_applies_writes() {
        let sheet = MemorySheet::new().with_tab("T", vec![vec!["a".into()]]);
        sheet
            .batch_update("T", &[PendingPatch::new(3, 2, "x")])
            .await
            .unwrap();
        assert_eq!(sheet.cell("T", 3, 2), "x");
        assert_eq!(sheet.rows("T").len(), 3);
    }

    #[tokio::test]
    async fn test_memory_sheet_quota_failures() {
        let sheet = MemorySheet::new().with_tab("T", vec![]);
        sheet.fail_with_quota(1);
        assert!(sheet.read_rows("T").await.unwrap_err().is_quota_exceeded());
        assert!(sheet.read_rows("T").await.is_ok());
    }
}

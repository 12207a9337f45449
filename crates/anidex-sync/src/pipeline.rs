//! End-to-end sync run.
//!
//! One run, strictly sequential:
//!
//! 1. Read the primary and hub tabs
//! 2. Build both layouts (a missing required header aborts here, before any
//!    write to either store)
//! 3. Normalize the primary rows
//! 4. Append new series to the hub
//! 5. Reconcile every row in one store session
//! 6. Flush queued patches to both tabs
//! 7. Commit the session
//! 8. Enrich in a second session and commit it
//!
//! A failure in steps 5 to 7 rolls back the session. Patches already flushed
//! stay in the sheet; the next run reuses those identifiers.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use anidex_core::{
    defaults, EntryRepository, EntrySession, MergePolicy, MetadataProvider, PendingPatch,
    ReconcileOutcome, Result, SheetClient, SyncReport,
};
use anidex_metadata::Pacer;
use anidex_sheets::{SheetWriter, WriterConfig};

use crate::enrichment::EnrichmentClient;
use crate::layout::{SheetLayout, HUB_REQUIRED, PRIMARY_REQUIRED};
use crate::normalizer::{normalize_rows, NormalizedRow};
use crate::progress::update_progress;
use crate::reconciler::reconcile;
use crate::series_tab::SeriesTabPopulator;

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Tab holding one row per catalog entry.
    pub primary_tab: String,
    /// Tab holding one row per distinct series.
    pub hub_tab: String,
    /// Whether to run the enrichment pass.
    pub enrich_enabled: bool,
    /// Spacing between metadata requests (never below the pacing floor).
    pub pacing: Duration,
    pub writer: WriterConfig,
    pub merge_policy: MergePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            primary_tab: defaults::PRIMARY_TAB.to_string(),
            hub_tab: defaults::HUB_TAB.to_string(),
            enrich_enabled: true,
            pacing: Pacer::floor(),
            writer: WriterConfig::default(),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SHEETS_PRIMARY_TAB` | `Anime` | Primary tab name |
    /// | `SHEETS_HUB_TAB` | `Franchise Hub` | Hub tab name |
    /// | `ENRICH_ENABLED` | `true` | Run the enrichment pass |
    /// | `ENRICH_PACING_MS` | `2000` | Metadata request spacing (floor 2000) |
    /// | `SYNC_PATCH_CHUNK_SIZE` | `50` | Cells per write call |
    /// | `SYNC_STICKY_FIELDS` | `cover_image_url,mal_rating` | Fill-only columns |
    pub fn from_env() -> Self {
        let enrich_enabled = std::env::var("ENRICH_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            primary_tab: std::env::var("SHEETS_PRIMARY_TAB")
                .unwrap_or_else(|_| defaults::PRIMARY_TAB.to_string()),
            hub_tab: std::env::var("SHEETS_HUB_TAB")
                .unwrap_or_else(|_| defaults::HUB_TAB.to_string()),
            enrich_enabled,
            pacing: Pacer::from_env().interval(),
            writer: WriterConfig::from_env(),
            merge_policy: MergePolicy::from_env(),
        }
    }

    /// Enable or disable the enrichment pass.
    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_enabled = enabled;
        self
    }
}

/// Owns the collaborators of a sync run.
///
/// The spreadsheet client should already route through
/// [`anidex_sheets::RetryingSheetClient`].
pub struct SyncEngine<R, C, P> {
    repo: R,
    sheets: C,
    metadata: P,
    config: SyncConfig,
}

impl<R, C, P> SyncEngine<R, C, P>
where
    R: EntryRepository,
    C: SheetClient,
    P: MetadataProvider,
{
    pub fn new(repo: R, sheets: C, metadata: P, config: SyncConfig) -> Self {
        Self {
            repo,
            sheets,
            metadata,
            config,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn sheets(&self) -> &C {
        &self.sheets
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Write a finished-episode count back to the primary tab.
    pub async fn update_progress(&self, system_id: &str, ep_fin: i32) -> Result<()> {
        update_progress(&self.sheets, &self.config.primary_tab, system_id, ep_fin).await
    }

    /// Run the full pipeline once.
    pub async fn run(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let primary_tab = self.config.primary_tab.as_str();
        let hub_tab = self.config.hub_tab.as_str();
        info!(subsystem = "sync", op = "run", primary_tab, hub_tab, "Sync run started");

        let primary_rows = self.sheets.read_rows(primary_tab).await?;
        let hub_rows = self.sheets.read_rows(hub_tab).await?;
        let primary = SheetLayout::from_rows(primary_tab, &primary_rows, PRIMARY_REQUIRED)?;
        let hub = SheetLayout::from_rows(hub_tab, &hub_rows, HUB_REQUIRED)?;

        let batch = normalize_rows(&primary, &primary_rows)?;
        let populator = SeriesTabPopulator::new(&hub)?;
        let hub_plan = populator.plan(&hub_rows, &batch.rows);

        let mut report = SyncReport::default();
        let appended = populator.rows_to_append(&hub_plan);
        if !appended.is_empty() {
            self.sheets.append_rows(hub_tab, &appended).await?;
            report.hub_rows_added = appended.len();
        }

        let mut session = self.repo.begin().await?;
        let staged = self
            .stage(&mut session, &batch.rows, &batch.patches, &hub_plan.patches, &mut report)
            .await;
        if let Err(e) = staged {
            error!(subsystem = "sync", op = "run", error = %e, "Sync run failed, rolling back");
            if let Err(rollback_err) = session.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(e);
        }
        session.commit().await?;

        if self.config.enrich_enabled {
            report.enriched = self.enrich().await?;
        }

        info!(
            subsystem = "sync",
            op = "run",
            created = report.created,
            updated = report.updated,
            enriched = report.enriched,
            patch_count = report.patches_written,
            hub_rows_added = report.hub_rows_added,
            duration_ms = started.elapsed().as_millis() as u64,
            "Sync run finished"
        );
        Ok(report)
    }

    /// Reconcile every row, then flush queued patches. Nothing is committed.
    async fn stage(
        &self,
        session: &mut R::Session,
        rows: &[NormalizedRow],
        primary_patches: &[PendingPatch],
        hub_patches: &[PendingPatch],
        report: &mut SyncReport,
    ) -> Result<()> {
        for row in rows {
            match reconcile(session, &row.entry, &self.config.merge_policy).await? {
                ReconcileOutcome::Created => report.created += 1,
                ReconcileOutcome::Updated => report.updated += 1,
            }
        }

        let writer = SheetWriter::new(&self.sheets, self.config.writer.clone());
        report.patches_written += writer.flush(&self.config.primary_tab, primary_patches).await?;
        report.patches_written += writer.flush(&self.config.hub_tab, hub_patches).await?;
        Ok(())
    }

    async fn enrich(&self) -> Result<usize> {
        let mut session = self.repo.begin().await?;
        let mut client = EnrichmentClient::new(&self.metadata, Pacer::new(self.config.pacing));
        match client.enrich(&mut session).await {
            Ok(summary) => {
                session.commit().await?;
                Ok(summary.enriched)
            }
            Err(e) => {
                error!(subsystem = "sync", op = "enrich", error = %e, "Enrichment aborted");
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

//! Metadata backfill for records missing a cover or a rating.

use tracing::{debug, info, warn};

use anidex_core::{EntrySession, ItemOutcome, MetadataProvider, Result};
use anidex_metadata::Pacer;

/// Totals for one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub candidates: usize,
    pub enriched: usize,
    pub skipped: usize,
}

/// Fetches metadata for eligible records one at a time under a [`Pacer`].
pub struct EnrichmentClient<'a, P> {
    provider: &'a P,
    pacer: Pacer,
}

impl<'a, P: MetadataProvider> EnrichmentClient<'a, P> {
    pub fn new(provider: &'a P, pacer: Pacer) -> Self {
        Self { provider, pacer }
    }

    /// Enrich every candidate in `session`. The caller commits.
    ///
    /// Skipped items (rate limited, fetch failure) never abort the pass; an
    /// `Err` from the provider or the store does.
    pub async fn enrich<S: EntrySession>(&mut self, session: &mut S) -> Result<EnrichmentSummary> {
        let candidates = session.enrichment_candidates().await?;
        let mut summary = EnrichmentSummary {
            candidates: candidates.len(),
            ..Default::default()
        };
        info!(
            subsystem = "sync",
            component = "enrichment",
            row_count = candidates.len(),
            "Starting enrichment"
        );

        for mut entry in candidates {
            let Some(mal_id) = entry.mal_id else {
                continue;
            };

            self.pacer.wait().await;

            match self.provider.fetch(mal_id).await? {
                ItemOutcome::Done(result) => {
                    if result.apply_to(&mut entry) {
                        session.update(&entry).await?;
                        summary.enriched += 1;
                        debug!(system_id = %entry.system_id, mal_id, "Enriched record");
                    } else {
                        debug!(system_id = %entry.system_id, mal_id, "Metadata had nothing to add");
                    }
                }
                ItemOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    warn!(
                        subsystem = "sync",
                        component = "enrichment",
                        system_id = %entry.system_id,
                        mal_id,
                        reason = %reason,
                        "Skipped enrichment"
                    );
                }
            }
        }

        info!(
            subsystem = "sync",
            component = "enrichment",
            enriched = summary.enriched,
            skipped = summary.skipped,
            "Enrichment finished"
        );
        Ok(summary)
    }
}

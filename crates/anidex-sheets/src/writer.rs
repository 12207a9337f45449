//! Batched write-back of pending patches.
//!
//! Patches are pure value-sets, so chunk order does not matter. Each chunk is
//! one `batch_update` call; pass a [`crate::RetryingSheetClient`] so every
//! chunk goes through quota back-off.

use tracing::{debug, info};

use anidex_core::{defaults, PendingPatch, Result, SheetClient};

/// Writer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Cells per `batch_update` call.
    pub chunk_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::PATCH_CHUNK_SIZE,
        }
    }
}

impl WriterConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_PATCH_CHUNK_SIZE` | `50` | Cells per write call |
    pub fn from_env() -> Self {
        let chunk_size = std::env::var("SYNC_PATCH_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::PATCH_CHUNK_SIZE)
            .max(1);
        Self { chunk_size }
    }
}

/// Flushes queued patches to one tab in fixed-size chunks.
pub struct SheetWriter<'a, C> {
    client: &'a C,
    config: WriterConfig,
}

impl<'a, C: SheetClient> SheetWriter<'a, C> {
    pub fn new(client: &'a C, config: WriterConfig) -> Self {
        Self { client, config }
    }

    /// Write every patch, returning the number of cells written.
    pub async fn flush(&self, tab: &str, patches: &[PendingPatch]) -> Result<usize> {
        if patches.is_empty() {
            debug!(subsystem = "sheets", component = "writer", tab, "Nothing to write back");
            return Ok(0);
        }

        let chunk_size = self.config.chunk_size.max(1);
        let mut chunks = 0;
        for chunk in patches.chunks(chunk_size) {
            self.client.batch_update(tab, chunk).await?;
            chunks += 1;
        }

        info!(
            subsystem = "sheets",
            component = "writer",
            tab,
            patch_count = patches.len(),
            chunks,
            "Wrote back pending patches"
        );
        Ok(patches.len())
    }
}

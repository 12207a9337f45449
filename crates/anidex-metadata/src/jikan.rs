//! Jikan v4 (MyAnimeList) metadata client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use anidex_core::{
    defaults, EnrichmentResult, Error, ItemOutcome, MetadataProvider, Result, SkipReason,
};

/// Configuration for the Jikan client.
#[derive(Debug, Clone)]
pub struct JikanConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::JIKAN_BASE_URL.to_string(),
            timeout_seconds: defaults::JIKAN_TIMEOUT_SECS,
        }
    }
}

impl JikanConfig {
    /// Create config from `JIKAN_BASE_URL` and `JIKAN_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("JIKAN_BASE_URL")
                .unwrap_or_else(|_| defaults::JIKAN_BASE_URL.to_string()),
            timeout_seconds: std::env::var("JIKAN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::JIKAN_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnimeResponse {
    data: AnimeData,
}

#[derive(Debug, Deserialize)]
struct AnimeData {
    #[serde(default)]
    images: Option<Images>,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Images {
    #[serde(default)]
    jpg: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
struct ImageSet {
    #[serde(default)]
    large_image_url: Option<String>,
}

impl From<AnimeData> for EnrichmentResult {
    fn from(data: AnimeData) -> Self {
        let cover_image_url = data
            .images
            .and_then(|i| i.jpg)
            .and_then(|j| j.large_image_url)
            .filter(|url| !url.trim().is_empty());
        Self {
            cover_image_url,
            mal_rating: data.score,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Jikan implementation of [`MetadataProvider`].
///
/// This client does not pace itself; callers iterate with a
/// [`crate::Pacer`].
pub struct JikanClient {
    client: Client,
    config: JikanConfig,
}

impl JikanClient {
    /// Create a new client with the given configuration.
    pub fn new(config: JikanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "metadata",
            component = "jikan",
            base_url = %config.base_url,
            "Initializing metadata client"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(JikanConfig::from_env())
    }

    fn anime_url(&self, mal_id: i32) -> String {
        format!(
            "{}/anime/{}",
            self.config.base_url.trim_end_matches('/'),
            mal_id
        )
    }
}

#[async_trait]
impl MetadataProvider for JikanClient {
    async fn fetch(&self, mal_id: i32) -> Result<ItemOutcome<EnrichmentResult>> {
        let response = match self.client.get(self.anime_url(mal_id)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(subsystem = "metadata", mal_id, error = %e, "Metadata request failed");
                return Ok(ItemOutcome::Skipped(SkipReason::FetchFailed(e.to_string())));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(subsystem = "metadata", mal_id, "Metadata service rate limited request");
            return Ok(ItemOutcome::Skipped(SkipReason::RateLimited));
        }
        if status != StatusCode::OK {
            warn!(
                subsystem = "metadata",
                mal_id,
                status = status.as_u16(),
                "Metadata service returned an error"
            );
            return Ok(ItemOutcome::Skipped(SkipReason::FetchFailed(format!(
                "HTTP {}",
                status.as_u16()
            ))));
        }

        match response.json::<AnimeResponse>().await {
            Ok(body) => {
                let result = EnrichmentResult::from(body.data);
                debug!(
                    subsystem = "metadata",
                    mal_id,
                    has_cover = result.cover_image_url.is_some(),
                    has_score = result.mal_rating.is_some(),
                    "Fetched metadata"
                );
                Ok(ItemOutcome::Done(result))
            }
            Err(e) => {
                warn!(subsystem = "metadata", mal_id, error = %e, "Undecodable metadata response");
                Ok(ItemOutcome::Skipped(SkipReason::FetchFailed(format!(
                    "invalid response: {}",
                    e
                ))))
            }
        }
    }
}

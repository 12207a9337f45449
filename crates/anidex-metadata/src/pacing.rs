//! Minimum spacing between requests to a rate-limited service.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

use anidex_core::defaults;

/// Enforces a minimum interval between successive calls.
///
/// The interval can be raised but never lowered below
/// [`defaults::ENRICH_MIN_PACING_MS`]: the upstream service caps requests per
/// second and bans clients that exceed it.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::ENRICH_MIN_PACING_MS))
    }
}

impl Pacer {
    /// Create a pacer; intervals below the floor are raised to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Self::floor()),
            last: None,
        }
    }

    /// Create from `ENRICH_PACING_MS` (default and floor 2000).
    pub fn from_env() -> Self {
        let ms = std::env::var("ENRICH_PACING_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ENRICH_MIN_PACING_MS);
        Self::new(Duration::from_millis(ms))
    }

    pub fn floor() -> Duration {
        Duration::from_millis(defaults::ENRICH_MIN_PACING_MS)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least one interval has passed since the previous call,
    /// then mark now as the latest call. The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}

//! Quota-aware retry for remote calls.
//!
//! A call that fails with [`Error::QuotaExceeded`] is retried after
//! `base_delay × attempt` (60 s, then 120 s, ... by default). Any other error
//! propagates immediately. Running out of attempts yields
//! [`Error::RetryBudgetExhausted`] naming the operation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use anidex_core::{defaults, Error, PendingPatch, Result, SheetClient};

/// Retry budget and back-off unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Back-off unit; attempt `n` waits `n × base_delay` before attempt `n + 1`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(defaults::RETRY_BASE_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Create policy from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_RETRY_MAX_ATTEMPTS` | `3` | Attempts per remote call |
    /// | `SYNC_RETRY_BASE_DELAY_SECS` | `60` | Back-off unit |
    pub fn from_env() -> Self {
        let max_attempts = std::env::var("SYNC_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS)
            .max(1);
        let base_delay_secs = std::env::var("SYNC_RETRY_BASE_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::RETRY_BASE_DELAY_SECS);

        Self {
            max_attempts,
            base_delay: Duration::from_secs(base_delay_secs),
        }
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Wraps remote calls with quota back-off.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `call` until it succeeds, fails with a non-quota error, or the
    /// attempt budget is spent.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op = operation, attempt, "Remote call recovered after back-off");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_quota_exceeded() => {
                    if attempt == attempts {
                        break;
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        subsystem = "sheets",
                        component = "retry",
                        op = operation,
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Quota exceeded, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::RetryBudgetExhausted {
            operation: operation.to_string(),
            attempts,
        })
    }
}

/// A [`SheetClient`] whose every call goes through a [`RetryExecutor`].
pub struct RetryingSheetClient<C> {
    inner: C,
    executor: RetryExecutor,
}

impl<C: SheetClient> RetryingSheetClient<C> {
    pub fn new(inner: C, executor: RetryExecutor) -> Self {
        Self { inner, executor }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: SheetClient> SheetClient for RetryingSheetClient<C> {
    async fn read_rows(&self, tab: &str) -> Result<Vec<Vec<String>>> {
        let inner = &self.inner;
        self.executor
            .execute(&format!("read_rows({})", tab), move || inner.read_rows(tab))
            .await
    }

    async fn batch_update(&self, tab: &str, patches: &[PendingPatch]) -> Result<()> {
        let inner = &self.inner;
        self.executor
            .execute(&format!("batch_update({}, {} cells)", tab, patches.len()), move || {
                inner.batch_update(tab, patches)
            })
            .await
    }

    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> Result<()> {
        let inner = &self.inner;
        self.executor
            .execute(&format!("update_cell({}, R{}C{})", tab, row, col), move || {
                inner.update_cell(tab, row, col, value)
            })
            .await
    }

    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<()> {
        let inner = &self.inner;
        self.executor
            .execute(&format!("append_rows({}, {} rows)", tab, rows.len()), move || {
                inner.append_rows(tab, rows)
            })
            .await
    }
}

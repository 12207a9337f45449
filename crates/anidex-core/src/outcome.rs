//! Per-item outcomes for batch loops.
//!
//! Batch loops (enrichment) continue past a skipped item and abort only on
//! `Err`. Keeping skips out of the error channel means callers never have to
//! inspect an error's identity to decide whether to continue.

use std::fmt;

/// Why an item was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The remote service reported quota exhaustion for this item.
    RateLimited,
    /// The remote call failed for any other reason.
    FetchFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::RateLimited => write!(f, "rate limited"),
            SkipReason::FetchFailed(msg) => write!(f, "fetch failed: {}", msg),
        }
    }
}

/// Result of processing one item in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    /// The item was processed.
    Done(T),
    /// The item was skipped; the batch continues.
    Skipped(SkipReason),
}

impl<T> ItemOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ItemOutcome::Done(_))
    }

    /// Convert into an `Option`, dropping the skip reason.
    pub fn done(self) -> Option<T> {
        match self {
            ItemOutcome::Done(value) => Some(value),
            ItemOutcome::Skipped(_) => None,
        }
    }
}

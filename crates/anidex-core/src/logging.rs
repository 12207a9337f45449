//! Structured logging field name constants for anidex.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Run aborted, requires operator attention |
//! | WARN  | Quota back-off, skipped enrichment, recoverable issue |
//! | INFO  | Lifecycle events, run totals |
//! | DEBUG | Decision points (inferences, patches, merges) |
//! | TRACE | Per-row iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "sync", "sheets", "metadata", "db", "api"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "normalizer", "reconciler", "retry", "writer", "enrichment"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Canonical record identifier.
pub const SYSTEM_ID: &str = "system_id";

/// External (MyAnimeList) numeric identifier.
pub const MAL_ID: &str = "mal_id";

/// Spreadsheet tab name.
pub const TAB: &str = "tab";

/// 1-based spreadsheet row.
pub const ROW: &str = "row";

// ─── Retry fields ──────────────────────────────────────────────────────────

/// 1-based attempt number.
pub const ATTEMPT: &str = "attempt";

/// Back-off delay before the next attempt, in seconds.
pub const DELAY_SECS: &str = "delay_secs";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows read or processed.
pub const ROW_COUNT: &str = "row_count";

/// Number of patches written or queued.
pub const PATCH_COUNT: &str = "patch_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

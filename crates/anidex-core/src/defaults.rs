//! Centralized default constants for anidex.
//!
//! Every crate reads its defaults from here rather than defining its own
//! magic numbers.

// =============================================================================
// SPREADSHEET
// =============================================================================

/// Google Sheets v4 REST endpoint.
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Tab holding one row per canonical entry.
pub const PRIMARY_TAB: &str = "Anime";

/// Tab holding one row per distinct series name.
pub const HUB_TAB: &str = "Franchise Hub";

/// Header row of a freshly created franchise hub tab.
pub const HUB_HEADERS: [&str; 6] = [
    "system_id",
    "series_en",
    "series_roman",
    "series_cn",
    "rating_series",
    "alt_name",
];

/// Request timeout for spreadsheet calls (seconds).
pub const SHEETS_TIMEOUT_SECS: u64 = 30;

/// Cells per batched write call.
pub const PATCH_CHUNK_SIZE: usize = 50;

// =============================================================================
// RETRY
// =============================================================================

/// Attempts before a quota-limited call is abandoned.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Back-off unit; attempt `n` waits `n` times this.
pub const RETRY_BASE_DELAY_SECS: u64 = 60;

// =============================================================================
// METADATA
// =============================================================================

/// Jikan (MyAnimeList) REST endpoint.
pub const JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Request timeout for metadata calls (seconds).
pub const JIKAN_TIMEOUT_SECS: u64 = 15;

/// Minimum spacing between metadata requests. Jikan caps clients at a few
/// requests per second; this is a floor, not a default.
pub const ENRICH_MIN_PACING_MS: u64 = 2000;

// =============================================================================
// DATABASE / SERVER
// =============================================================================

/// Fallback database URL.
pub const DATABASE_URL: &str = "postgres://localhost/anidex";

/// Default HTTP port.
pub const PORT: u16 = 8000;

/// Season string assumed for a franchise with a single entry.
pub const DEFAULT_SEASON: &str = "Season 1";

//! Google Sheets v4 REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use anidex_core::{defaults, Error, PendingPatch, Result, SheetClient};

use crate::a1::{cell_range, tab_range};

/// Value input mode for all writes; lets the sheet parse numbers the way a
/// human typing them would.
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Configuration for the spreadsheet client.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// Spreadsheet document id.
    pub spreadsheet_id: String,
    /// OAuth bearer token (optional for public read-only sheets).
    pub access_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl SheetsConfig {
    /// Create config for a spreadsheet with default endpoint settings.
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            base_url: defaults::SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: None,
            timeout_seconds: defaults::SHEETS_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SHEETS_SPREADSHEET_ID` | (required) | Document id |
    /// | `SHEETS_ACCESS_TOKEN` | unset | Bearer token |
    /// | `SHEETS_BASE_URL` | `https://sheets.googleapis.com/v4` | Endpoint |
    /// | `SHEETS_TIMEOUT_SECS` | `30` | Request timeout |
    pub fn from_env() -> Result<Self> {
        let spreadsheet_id = std::env::var("SHEETS_SPREADSHEET_ID")
            .map_err(|_| Error::Config("SHEETS_SPREADSHEET_ID is not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("SHEETS_BASE_URL")
                .unwrap_or_else(|_| defaults::SHEETS_BASE_URL.to_string()),
            spreadsheet_id,
            access_token: std::env::var("SHEETS_ACCESS_TOKEN").ok(),
            timeout_seconds: std::env::var("SHEETS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::SHEETS_TIMEOUT_SECS),
        })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct RangeValues<'a> {
    range: String,
    values: Vec<Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'static str,
    data: Vec<RangeValues<'a>>,
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: &'a [Vec<String>],
}

/// Render a cell as text. The API returns formatted strings by default but
/// may return numbers or booleans for unformatted cells.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whether an error body carries the quota signal.
fn is_quota_body(body: &str) -> bool {
    body.contains("RESOURCE_EXHAUSTED")
        || body.contains("RATE_LIMIT_EXCEEDED")
        || body.to_ascii_lowercase().contains("quota exceeded")
}

// =============================================================================
// CLIENT
// =============================================================================

/// Sheets v4 REST implementation of [`SheetClient`].
pub struct GoogleSheetsClient {
    client: Client,
    config: SheetsConfig,
}

impl GoogleSheetsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "sheets",
            component = "client",
            base_url = %config.base_url,
            spreadsheet_id = %config.spreadsheet_id,
            authenticated = config.access_token.is_some(),
            "Initializing spreadsheet client"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SheetsConfig::from_env()?)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }

    fn batch_update_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            self.config.base_url.trim_end_matches('/'),
            self.config.spreadsheet_id
        )
    }

    /// Attach auth, send, and classify the response status.
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let request = match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            trace!(op = operation, status = status.as_u16(), "Spreadsheet call succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS || is_quota_body(&body) {
            return Err(Error::QuotaExceeded(format!(
                "{}: HTTP {}",
                operation,
                status.as_u16()
            )));
        }
        Err(Error::Request(format!(
            "{} failed: HTTP {}: {}",
            operation,
            status.as_u16(),
            body
        )))
    }
}

#[async_trait]
impl SheetClient for GoogleSheetsClient {
    async fn read_rows(&self, tab: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(&tab_range(tab), "?majorDimension=ROWS");
        let response = self.send(self.client.get(&url), "read_rows").await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Invalid values response: {}", e)))?;

        let rows: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        debug!(subsystem = "sheets", tab, row_count = rows.len(), "Read tab");
        Ok(rows)
    }

    async fn batch_update(&self, tab: &str, patches: &[PendingPatch]) -> Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let body = BatchUpdateRequest {
            value_input_option: VALUE_INPUT_OPTION,
            data: patches
                .iter()
                .map(|p| RangeValues {
                    range: cell_range(tab, p.row, p.col),
                    values: vec![vec![p.value.as_str()]],
                })
                .collect(),
        };
        self.send(
            self.client.post(self.batch_update_url()).json(&body),
            "batch_update",
        )
        .await?;
        debug!(subsystem = "sheets", tab, patch_count = patches.len(), "Wrote cell batch");
        Ok(())
    }

    async fn update_cell(&self, tab: &str, row: usize, col: usize, value: &str) -> Result<()> {
        let range = cell_range(tab, row, col);
        let url = self.values_url(
            &range,
            &format!("?valueInputOption={}", VALUE_INPUT_OPTION),
        );
        let body = RangeValues {
            range,
            values: vec![vec![value]],
        };
        self.send(self.client.put(&url).json(&body), "update_cell")
            .await?;
        debug!(subsystem = "sheets", tab, row, col, "Wrote cell");
        Ok(())
    }

    async fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.values_url(
            &format!("{}!A1", tab_range(tab)),
            &format!(
                ":append?valueInputOption={}&insertDataOption=INSERT_ROWS",
                VALUE_INPUT_OPTION
            ),
        );
        self.send(
            self.client.post(&url).json(&AppendRequest { values: rows }),
            "append_rows",
        )
        .await?;
        debug!(subsystem = "sheets", tab, row_count = rows.len(), "Appended rows");
        Ok(())
    }
}

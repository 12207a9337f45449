//! Header-row layout of a spreadsheet tab.

use std::collections::HashMap;

use anidex_core::{Error, Field, Result};

/// Headers the primary tab must carry for normalization and write-back.
pub const PRIMARY_REQUIRED: &[&str] = &[
    "system_id",
    "series_en",
    "series_season",
    "airing_type",
    "ep_total",
    "mal_id",
];

/// Headers the franchise hub tab must carry.
pub const HUB_REQUIRED: &[&str] = &["system_id", "series_en"];

/// Header name to 0-based column index, built once per run.
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    tab: String,
    columns: HashMap<String, usize>,
    fields: Vec<(Field, usize)>,
    width: usize,
}

impl SheetLayout {
    /// Build from a header row. Blank headers are ignored; the first
    /// occurrence of a duplicated header wins.
    pub fn from_header(tab: &str, header: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if !name.is_empty() {
                columns.entry(name.to_string()).or_insert(idx);
            }
        }

        let fields = Field::ALL
            .iter()
            .filter_map(|f| columns.get(f.header()).map(|&idx| (*f, idx)))
            .collect();

        Self {
            tab: tab.to_string(),
            columns,
            fields,
            width: header.len(),
        }
    }

    /// Build from a tab's rows and check the required headers.
    ///
    /// An empty tab has no header row and fails the check.
    pub fn from_rows(tab: &str, rows: &[Vec<String>], required: &[&str]) -> Result<Self> {
        let header = rows.first().map(Vec::as_slice).unwrap_or(&[]);
        let layout = Self::from_header(tab, header);
        layout.require(required)?;
        Ok(layout)
    }

    /// Fail with a configuration error naming every missing header.
    pub fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|h| !self.columns.contains_key(*h))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "tab '{}' is missing required header(s): {}",
                self.tab,
                missing.join(", ")
            )))
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    /// Number of header cells, including blank ones.
    pub fn width(&self) -> usize {
        self.width
    }

    /// 0-based index of a header.
    pub fn index(&self, header: &str) -> Option<usize> {
        self.columns.get(header).copied()
    }

    /// 1-based spreadsheet column of a header, for patches.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.index(header).map(|i| i + 1)
    }

    /// Like [`Self::column`], but a missing header is a configuration error.
    pub fn require_column(&self, header: &str) -> Result<usize> {
        self.column(header).ok_or_else(|| {
            Error::Config(format!(
                "tab '{}' has no '{}' header",
                self.tab, header
            ))
        })
    }

    /// Canonical fields present on this tab with their 0-based index.
    pub fn fields(&self) -> &[(Field, usize)] {
        &self.fields
    }

    /// Raw cell under a header, `None` when the header or the cell is absent.
    /// Short rows are tolerated.
    pub fn cell<'r>(&self, row: &'r [String], header: &str) -> Option<&'r str> {
        self.index(header)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    /// Trimmed, non-blank cell under a header.
    pub fn text<'r>(&self, row: &'r [String], header: &str) -> Option<&'r str> {
        self.cell(row, header)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

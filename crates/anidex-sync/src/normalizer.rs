//! Row normalization: raw spreadsheet rows to canonical records.
//!
//! Normalization is pure apart from identifier minting. Every value the
//! normalizer invents (identifier, extracted `mal_id`, inferred season,
//! corrected episode count) is also queued as a [`PendingPatch`] so the
//! spreadsheet converges on the same data as the store.
//!
//! Derivations run in a fixed order:
//!
//! 1. Value cleaning (blank or unparseable cells become absent)
//! 2. Identifier assignment
//! 3. `mal_id` extraction from `mal_link`
//! 4. Season inference
//! 5. Movie episode-count correction

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use anidex_core::{
    defaults, new_system_id, AnimeEntry, Field, FieldKind, FieldValue, PendingPatch, Result,
};

use crate::layout::SheetLayout;

static SEASON_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseason\s*([0-9]+)(?:\s*part\s*([0-9]+))?").unwrap()
});

static SEASON_CN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第([一二三四五六七八九十]|[0-9]+)季").unwrap());

static MAL_ANIME_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)myanimelist\.net/anime/([0-9]+)").unwrap());

// =============================================================================
// VALUE CLEANING
// =============================================================================

/// Coerce a raw cell to a column's kind.
///
/// Blank cells and values that do not parse as the column's kind are absent.
pub fn clean_value(kind: FieldKind, raw: &str) -> Option<FieldValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match kind {
        FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
        FieldKind::Int => parse_int(raw).map(FieldValue::Int),
        FieldKind::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float),
    }
}

/// Integers may be rendered with a zero fraction ("12.0").
fn parse_int(raw: &str) -> Option<i32> {
    if let Ok(n) = raw.parse::<i32>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

// =============================================================================
// DERIVATION RULES
// =============================================================================

/// Extract the numeric anime id from a MyAnimeList URL.
pub fn extract_mal_id(link: &str) -> Option<i32> {
    MAL_ANIME_URL
        .captures(link)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn cjk_numeral(s: &str) -> Option<u32> {
    let n = match s {
        "一" => 1,
        "二" => 2,
        "三" => 3,
        "四" => 4,
        "五" => 5,
        "六" => 6,
        "七" => 7,
        "八" => 8,
        "九" => 9,
        "十" => 10,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

/// Season label from an English title, e.g. "Season 2 Part 1".
pub fn season_from_english(title: &str) -> Option<String> {
    let caps = SEASON_EN.captures(title)?;
    let season: u32 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
        Some(part) => Some(format!("Season {} Part {}", season, part)),
        None => Some(format!("Season {}", season)),
    }
}

/// Season label from a Chinese title containing `第N季`.
pub fn season_from_chinese(title: &str) -> Option<String> {
    let caps = SEASON_CN.captures(title)?;
    let season = cjk_numeral(caps.get(1)?.as_str())?;
    Some(format!("Season {}", season))
}

fn is_movie(airing_type: Option<&str>) -> bool {
    airing_type.is_some_and(|t| t.trim().eq_ignore_ascii_case("movie"))
}

// =============================================================================
// SERIES FREQUENCY
// =============================================================================

/// How many rows of the batch carry each primary series name.
#[derive(Debug, Clone, Default)]
pub struct SeriesFrequency {
    counts: HashMap<String, usize>,
}

impl SeriesFrequency {
    /// Count `series_en` over the data rows (header excluded).
    pub fn from_rows<'r>(
        layout: &SheetLayout,
        rows: impl IntoIterator<Item = &'r Vec<String>>,
    ) -> Self {
        let mut counts = HashMap::new();
        for row in rows {
            if let Some(name) = layout.text(row, Field::SeriesEn.header()) {
                *counts.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, series: &str) -> usize {
        self.counts.get(series.trim()).copied().unwrap_or(0)
    }
}

// =============================================================================
// NORMALIZER
// =============================================================================

/// One normalized data row.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// 1-based sheet row.
    pub row: usize,
    pub entry: AnimeEntry,
}

/// Normalized rows plus every correction to write back.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub rows: Vec<NormalizedRow>,
    pub patches: Vec<PendingPatch>,
}

/// Normalizes rows of one primary tab.
pub struct RowNormalizer<'a> {
    layout: &'a SheetLayout,
    frequency: &'a SeriesFrequency,
    system_id_col: usize,
    mal_id_col: usize,
    season_col: usize,
    ep_total_col: usize,
}

impl<'a> RowNormalizer<'a> {
    /// Resolve the write-back columns; fails if any is missing.
    pub fn new(layout: &'a SheetLayout, frequency: &'a SeriesFrequency) -> Result<Self> {
        Ok(Self {
            layout,
            frequency,
            system_id_col: layout.require_column(Field::SystemId.header())?,
            mal_id_col: layout.require_column(Field::MalId.header())?,
            season_col: layout.require_column(Field::SeriesSeason.header())?,
            ep_total_col: layout.require_column(Field::EpTotal.header())?,
        })
    }

    /// Normalize one row at 1-based position `row`.
    pub fn normalize(&self, row: usize, cells: &[String]) -> (AnimeEntry, Vec<PendingPatch>) {
        let mut entry = AnimeEntry::default();
        let mut patches = Vec::new();

        for &(field, idx) in self.layout.fields() {
            let value = cells
                .get(idx)
                .and_then(|raw| clean_value(field.kind(), raw));
            entry.set(field, value);
        }

        if entry.system_id.is_empty() {
            entry.system_id = new_system_id();
            debug!(row, system_id = %entry.system_id, "Minted identifier");
            patches.push(PendingPatch::new(row, self.system_id_col, entry.system_id.clone()));
        }

        if entry.mal_id.is_none() {
            if let Some(mal_id) = entry.mal_link.as_deref().and_then(extract_mal_id) {
                debug!(row, mal_id, "Extracted mal_id from link");
                entry.mal_id = Some(mal_id);
                patches.push(PendingPatch::new(row, self.mal_id_col, mal_id.to_string()));
            }
        }

        if entry.series_season.is_none() {
            if let Some(season) = self.infer_season(&entry) {
                debug!(row, season = %season, "Inferred season");
                patches.push(PendingPatch::new(row, self.season_col, season.clone()));
                entry.series_season = Some(season);
            }
        }

        if is_movie(entry.airing_type.as_deref()) && entry.ep_total != Some(1) {
            debug!(row, ep_total = ?entry.ep_total, "Corrected movie episode count");
            entry.ep_total = Some(1);
            patches.push(PendingPatch::new(row, self.ep_total_col, "1"));
        }

        trace!(row, system_id = %entry.system_id, patch_count = patches.len(), "Normalized row");
        (entry, patches)
    }

    fn infer_season(&self, entry: &AnimeEntry) -> Option<String> {
        entry
            .series_season_en
            .as_deref()
            .and_then(season_from_english)
            .or_else(|| {
                entry
                    .series_season_cn
                    .as_deref()
                    .and_then(season_from_chinese)
            })
            .or_else(|| {
                let series = entry.series_en.as_deref()?;
                (self.frequency.count(series) == 1).then(|| defaults::DEFAULT_SEASON.to_string())
            })
    }
}

fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// Normalize every data row of a tab (`rows[0]` is the header).
///
/// Entirely blank rows are skipped.
pub fn normalize_rows(layout: &SheetLayout, rows: &[Vec<String>]) -> Result<NormalizedBatch> {
    let data: Vec<(usize, &Vec<String>)> = rows
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cells)| !is_blank_row(cells))
        .map(|(idx, cells)| (idx + 1, cells))
        .collect();

    let frequency = SeriesFrequency::from_rows(layout, data.iter().map(|(_, cells)| *cells));
    let normalizer = RowNormalizer::new(layout, &frequency)?;

    let mut batch = NormalizedBatch::default();
    for (row, cells) in data {
        let (entry, patches) = normalizer.normalize(row, cells);
        batch.patches.extend(patches);
        batch.rows.push(NormalizedRow { row, entry });
    }

    debug!(
        subsystem = "sync",
        component = "normalizer",
        tab = layout.tab(),
        row_count = batch.rows.len(),
        patch_count = batch.patches.len(),
        "Normalized tab"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PRIMARY_REQUIRED;

    const HEADER: &[&str] = &[
        "system_id",
        "series_en",
        "series_season_en",
        "series_season_cn",
        "series_season",
        "airing_type",
        "ep_total",
        "mal_id",
        "mal_link",
        "mal_rating",
    ];

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn sheet(data: &[&[&str]]) -> Vec<Vec<String>> {
        std::iter::once(row(HEADER))
            .chain(data.iter().map(|r| row(r)))
            .collect()
    }

    fn normalize(data: &[&[&str]]) -> NormalizedBatch {
        let rows = sheet(data);
        let layout = SheetLayout::from_rows("Anime", &rows, PRIMARY_REQUIRED).unwrap();
        normalize_rows(&layout, &rows).unwrap()
    }

    fn patches_in_col(batch: &NormalizedBatch, col: usize) -> Vec<&PendingPatch> {
        batch.patches.iter().filter(|p| p.col == col).collect()
    }

    #[test]
    fn test_clean_value_blank_and_bad_numbers_are_absent() {
        assert_eq!(clean_value(FieldKind::Text, "   "), None);
        assert_eq!(clean_value(FieldKind::Int, "twelve"), None);
        assert_eq!(clean_value(FieldKind::Float, "n/a"), None);
        assert_eq!(clean_value(FieldKind::Int, " 12 "), Some(FieldValue::Int(12)));
        assert_eq!(clean_value(FieldKind::Int, "12.0"), Some(FieldValue::Int(12)));
        assert_eq!(clean_value(FieldKind::Int, "12.5"), None);
        assert_eq!(clean_value(FieldKind::Float, "8.75"), Some(FieldValue::Float(8.75)));
        assert_eq!(
            clean_value(FieldKind::Text, "  Bones "),
            Some(FieldValue::Text("Bones".into()))
        );
    }

    #[test]
    fn test_blank_identifier_minted_with_one_patch() {
        let batch = normalize(&[&["", "Frieren", "", "", "Season 1", "TV", "28", "52991"]]);

        let entry = &batch.rows[0].entry;
        assert!(!entry.system_id.is_empty());
        let id_patches = patches_in_col(&batch, 1);
        assert_eq!(id_patches.len(), 1);
        assert_eq!(id_patches[0].row, 2);
        assert_eq!(id_patches[0].value, entry.system_id);
    }

    #[test]
    fn test_identified_row_gets_no_identifier_patch() {
        let batch = normalize(&[&["abc", "Frieren", "", "", "Season 1", "TV", "28", "52991"]]);
        assert_eq!(batch.rows[0].entry.system_id, "abc");
        assert!(batch.patches.is_empty());
    }

    #[test]
    fn test_renormalizing_written_back_row_yields_no_id_patch() {
        let first = normalize(&[&["", "Frieren", "", "", "Season 1", "TV", "28", "52991"]]);
        let minted = first.rows[0].entry.system_id.clone();

        let second = normalize(&[&[minted.as_str(), "Frieren", "", "", "Season 1", "TV", "28", "52991"]]);
        assert_eq!(second.rows[0].entry.system_id, minted);
        assert!(patches_in_col(&second, 1).is_empty());
    }

    #[test]
    fn test_mal_id_extracted_from_link() {
        let batch = normalize(&[&[
            "a",
            "Frieren",
            "",
            "",
            "Season 1",
            "TV",
            "28",
            "",
            "https://myanimelist.net/anime/52991/Sousou_no_Frieren",
        ]]);
        assert_eq!(batch.rows[0].entry.mal_id, Some(52991));
        let patches = patches_in_col(&batch, 8);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].value, "52991");
    }

    #[test]
    fn test_mal_id_present_not_overridden_by_link() {
        let batch = normalize(&[&[
            "a",
            "X",
            "",
            "",
            "Season 1",
            "TV",
            "12",
            "1",
            "https://myanimelist.net/anime/2",
        ]]);
        assert_eq!(batch.rows[0].entry.mal_id, Some(1));
        assert!(batch.patches.is_empty());
    }

    #[test]
    fn test_unrecognized_link_leaves_mal_id_absent() {
        assert_eq!(extract_mal_id("https://anilist.co/anime/154587"), None);
        assert_eq!(extract_mal_id("not a link"), None);
    }

    #[test]
    fn test_season_from_english_with_part() {
        assert_eq!(
            season_from_english("Show Season 2 Part 1").as_deref(),
            Some("Season 2 Part 1")
        );
        assert_eq!(season_from_english("SHOW season 3").as_deref(), Some("Season 3"));
        assert_eq!(season_from_english("Show: The Movie"), None);
    }

    #[test]
    fn test_season_from_chinese_numerals() {
        assert_eq!(season_from_chinese("某動畫 第三季").as_deref(), Some("Season 3"));
        assert_eq!(season_from_chinese("第十季").as_deref(), Some("Season 10"));
        assert_eq!(season_from_chinese("第2季").as_deref(), Some("Season 2"));
        assert_eq!(season_from_chinese("劇場版"), None);
    }

    #[test]
    fn test_season_inferred_from_english_title() {
        let batch = normalize(&[
            &["a", "Show", "Show Season 2 Part 1", "", "", "TV", "12", "1"],
            &["b", "Show", "", "", "Season 1", "TV", "12", "2"],
        ]);
        assert_eq!(
            batch.rows[0].entry.series_season.as_deref(),
            Some("Season 2 Part 1")
        );
        let patches = patches_in_col(&batch, 5);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].row, 2);
    }

    #[test]
    fn test_season_inferred_from_chinese_title() {
        let batch = normalize(&[
            &["a", "Show", "", "某動畫 第三季", "", "TV", "12", "1"],
            &["b", "Show", "", "", "Season 1", "TV", "12", "2"],
        ]);
        assert_eq!(batch.rows[0].entry.series_season.as_deref(), Some("Season 3"));
    }

    #[test]
    fn test_single_row_series_defaults_to_season_one() {
        let batch = normalize(&[&["a", "Lonely Show", "", "", "", "TV", "12", "1"]]);
        assert_eq!(batch.rows[0].entry.series_season.as_deref(), Some("Season 1"));
        assert_eq!(patches_in_col(&batch, 5).len(), 1);
    }

    #[test]
    fn test_multi_row_series_without_markers_not_inferred() {
        let batch = normalize(&[
            &["a", "Show", "", "", "", "TV", "12", "1"],
            &["b", "Show", "", "", "", "TV", "12", "2"],
        ]);
        assert!(batch.rows.iter().all(|r| r.entry.series_season.is_none()));
        assert!(patches_in_col(&batch, 5).is_empty());
    }

    #[test]
    fn test_existing_season_never_replaced() {
        let batch = normalize(&[&["a", "Show", "Show Season 4", "", "S4", "TV", "12", "1"]]);
        assert_eq!(batch.rows[0].entry.series_season.as_deref(), Some("S4"));
        assert!(batch.patches.is_empty());
    }

    #[test]
    fn test_movie_episode_count_corrected() {
        let batch = normalize(&[&["a", "Film", "", "", "Season 1", "Movie", "12", "1"]]);
        assert_eq!(batch.rows[0].entry.ep_total, Some(1));
        let patches = patches_in_col(&batch, 7);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].value, "1");
    }

    #[test]
    fn test_movie_with_blank_count_corrected() {
        let batch = normalize(&[&["a", "Film", "", "", "Season 1", "movie", "", "1"]]);
        assert_eq!(batch.rows[0].entry.ep_total, Some(1));
        assert_eq!(patches_in_col(&batch, 7).len(), 1);
    }

    #[test]
    fn test_movie_with_one_episode_not_patched() {
        let batch = normalize(&[&["a", "Film", "", "", "Season 1", "Movie", "1", "1"]]);
        assert_eq!(batch.rows[0].entry.ep_total, Some(1));
        assert!(batch.patches.is_empty());
    }

    #[test]
    fn test_non_numeric_cells_become_absent() {
        let batch = normalize(&[&["a", "X", "", "", "Season 1", "TV", "??", "1", "", "n/a"]]);
        let entry = &batch.rows[0].entry;
        assert_eq!(entry.ep_total, None);
        assert_eq!(entry.mal_rating, None);
    }

    #[test]
    fn test_blank_rows_skipped_and_positions_kept() {
        let batch = normalize(&[
            &["a", "X", "", "", "Season 1", "TV", "12", "1"],
            &["", "  ", ""],
            &["b", "Y", "", "", "Season 1", "TV", "12", "2"],
        ]);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0].row, 2);
        assert_eq!(batch.rows[1].row, 4);
    }

    #[test]
    fn test_series_frequency_trims_names() {
        let rows = sheet(&[&["a", " Show "], &["b", "Show"], &["c", "Other"]]);
        let layout = SheetLayout::from_header("Anime", &rows[0]);
        let freq = SeriesFrequency::from_rows(&layout, rows.iter().skip(1));
        assert_eq!(freq.count("Show"), 2);
        assert_eq!(freq.count("Other"), 1);
        assert_eq!(freq.count("Missing"), 0);
    }
}

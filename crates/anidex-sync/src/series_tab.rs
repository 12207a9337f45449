//! Franchise hub maintenance.
//!
//! The hub tab holds one row per distinct `series_en`. Existing rows are
//! never edited except to receive a missing identifier; new series are
//! appended with only `system_id` and `series_en` filled in.

use std::collections::HashSet;

use tracing::{debug, info};

use anidex_core::{new_system_id, FranchiseRecord, PendingPatch, Result};

use crate::layout::{SheetLayout, HUB_REQUIRED};
use crate::normalizer::NormalizedRow;

/// Changes to apply to the hub tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HubPlan {
    /// Identifier backfills for existing rows.
    pub patches: Vec<PendingPatch>,
    /// New rows, one per previously unseen series.
    pub appended: Vec<FranchiseRecord>,
}

/// Plans hub backfills and appends from a normalized batch.
pub struct SeriesTabPopulator<'a> {
    layout: &'a SheetLayout,
    system_id_col: usize,
}

impl<'a> SeriesTabPopulator<'a> {
    pub fn new(layout: &'a SheetLayout) -> Result<Self> {
        layout.require(HUB_REQUIRED)?;
        Ok(Self {
            layout,
            system_id_col: layout.require_column("system_id")?,
        })
    }

    /// Read one hub row.
    pub fn read_record(&self, cells: &[String]) -> FranchiseRecord {
        let text = |header: &str| self.layout.text(cells, header).map(str::to_string);
        FranchiseRecord {
            system_id: text("system_id"),
            series_en: text("series_en").unwrap_or_default(),
            series_roman: text("series_roman"),
            series_cn: text("series_cn"),
            rating_series: text("rating_series"),
            alt_name: text("alt_name"),
        }
    }

    /// Lay a record out in this tab's column order.
    pub fn to_row(&self, record: &FranchiseRecord) -> Vec<String> {
        let mut row = vec![String::new(); self.layout.width()];
        let values = [
            ("system_id", record.system_id.as_deref()),
            ("series_en", Some(record.series_en.as_str())),
            ("series_roman", record.series_roman.as_deref()),
            ("series_cn", record.series_cn.as_deref()),
            ("rating_series", record.rating_series.as_deref()),
            ("alt_name", record.alt_name.as_deref()),
        ];
        for (header, value) in values {
            if let (Some(idx), Some(value)) = (self.layout.index(header), value) {
                row[idx] = value.to_string();
            }
        }
        row
    }

    /// Plan identifier backfills for `hub_rows` (header first) and one new
    /// row for each series name in `entries` not yet on the tab.
    pub fn plan(&self, hub_rows: &[Vec<String>], entries: &[NormalizedRow]) -> HubPlan {
        let mut plan = HubPlan::default();
        let mut known: HashSet<String> = HashSet::new();

        for (idx, cells) in hub_rows.iter().enumerate().skip(1) {
            let record = self.read_record(cells);
            if record.series_en.is_empty() && record.system_id.is_none() {
                continue;
            }
            if record.system_id.is_none() {
                let id = new_system_id();
                debug!(row = idx + 1, system_id = %id, "Backfilled hub identifier");
                plan.patches
                    .push(PendingPatch::new(idx + 1, self.system_id_col, id));
            }
            if !record.series_en.is_empty() {
                known.insert(record.series_en);
            }
        }

        for normalized in entries {
            let Some(series) = normalized.entry.series_en.as_deref().map(str::trim) else {
                continue;
            };
            if series.is_empty() || known.contains(series) {
                continue;
            }
            known.insert(series.to_string());
            plan.appended.push(FranchiseRecord {
                system_id: Some(new_system_id()),
                series_en: series.to_string(),
                ..Default::default()
            });
        }

        info!(
            subsystem = "sync",
            component = "series_tab",
            tab = self.layout.tab(),
            known_series = known.len(),
            patch_count = plan.patches.len(),
            row_count = plan.appended.len(),
            "Planned franchise hub update"
        );
        plan
    }

    /// Rows to append for a plan.
    pub fn rows_to_append(&self, plan: &HubPlan) -> Vec<Vec<String>> {
        plan.appended.iter().map(|r| self.to_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anidex_core::{defaults, AnimeEntry};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn hub(data: &[&[&str]]) -> Vec<Vec<String>> {
        std::iter::once(defaults::HUB_HEADERS.iter().map(|s| s.to_string()).collect())
            .chain(data.iter().map(|r| row(r)))
            .collect()
    }

    fn entry(series: &str) -> NormalizedRow {
        NormalizedRow {
            row: 2,
            entry: AnimeEntry {
                system_id: "x".into(),
                series_en: (!series.is_empty()).then(|| series.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_new_series_appended_once() {
        let rows = hub(&[]);
        let layout = SheetLayout::from_header("Franchise Hub", &rows[0]);
        let populator = SeriesTabPopulator::new(&layout).unwrap();

        let plan = populator.plan(&rows, &[entry("Frieren"), entry("Frieren"), entry("Mushishi")]);

        assert!(plan.patches.is_empty());
        let names: Vec<&str> = plan.appended.iter().map(|r| r.series_en.as_str()).collect();
        assert_eq!(names, vec!["Frieren", "Mushishi"]);
        assert!(plan.appended.iter().all(|r| r.system_id.is_some()));
    }

    #[test]
    fn test_known_series_not_appended() {
        let rows = hub(&[&["h1", "Frieren", "Sousou no Frieren"]]);
        let layout = SheetLayout::from_header("Franchise Hub", &rows[0]);
        let populator = SeriesTabPopulator::new(&layout).unwrap();

        let plan = populator.plan(&rows, &[entry("Frieren"), entry(" Frieren ")]);
        assert_eq!(plan, HubPlan::default());
    }

    #[test]
    fn test_blank_series_names_ignored() {
        let rows = hub(&[]);
        let layout = SheetLayout::from_header("Franchise Hub", &rows[0]);
        let populator = SeriesTabPopulator::new(&layout).unwrap();

        let plan = populator.plan(&rows, &[entry(""), entry("   ")]);
        assert!(plan.appended.is_empty());
    }

    #[test]
    fn test_missing_hub_identifier_backfilled_in_place() {
        let rows = hub(&[&["h1", "Frieren"], &["", "Mushishi", "", "蟲師"]]);
        let layout = SheetLayout::from_header("Franchise Hub", &rows[0]);
        let populator = SeriesTabPopulator::new(&layout).unwrap();

        let plan = populator.plan(&rows, &[entry("Mushishi")]);

        assert_eq!(plan.patches.len(), 1);
        assert_eq!(plan.patches[0].row, 3);
        assert_eq!(plan.patches[0].col, 1);
        assert!(!plan.patches[0].value.is_empty());
        assert!(plan.appended.is_empty());
    }

    #[test]
    fn test_appended_row_follows_tab_column_order() {
        let header = row(&["series_en", "notes", "system_id"]);
        let layout = SheetLayout::from_header("Franchise Hub", &header);
        let populator = SeriesTabPopulator::new(&layout).unwrap();

        let record = FranchiseRecord {
            system_id: Some("id-1".into()),
            series_en: "Frieren".into(),
            ..Default::default()
        };
        assert_eq!(populator.to_row(&record), row(&["Frieren", "", "id-1"]));
    }

    #[test]
    fn test_hub_without_required_headers_rejected() {
        let layout = SheetLayout::from_header("Franchise Hub", &row(&["series_en"]));
        assert!(SeriesTabPopulator::new(&layout).is_err());
    }
}

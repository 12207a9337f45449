//! Single-cell progress write-back.

use tracing::info;

use anidex_core::{Error, Field, Result, SheetClient};

use crate::layout::SheetLayout;

/// Write `ep_fin` for the row whose `system_id` matches.
///
/// Fails with [`Error::Config`] when the tab lacks a `system_id` or `ep_fin`
/// header and with [`Error::NotFound`] when no row carries the identifier.
pub async fn update_progress<C: SheetClient>(
    client: &C,
    tab: &str,
    system_id: &str,
    ep_fin: i32,
) -> Result<()> {
    let rows = client.read_rows(tab).await?;
    let header = rows.first().map(Vec::as_slice).unwrap_or(&[]);
    let layout = SheetLayout::from_header(tab, header);

    layout.require_column(Field::SystemId.header())?;
    let ep_fin_col = layout.require_column(Field::EpFin.header())?;

    let target = system_id.trim();
    let row = rows
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, cells)| layout.text(cells, Field::SystemId.header()) == Some(target))
        .map(|(idx, _)| idx + 1)
        .ok_or_else(|| Error::NotFound(format!("system_id {} on tab '{}'", target, tab)))?;

    client
        .update_cell(tab, row, ep_fin_col, &ep_fin.to_string())
        .await?;
    info!(
        subsystem = "sync",
        component = "progress",
        system_id = target,
        row,
        ep_fin,
        "Updated progress"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anidex_core::mock::{MemorySheet, SheetCall};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_updates_exactly_one_cell() {
        let sheet = MemorySheet::new().with_tab(
            "Anime",
            vec![
                row(&["system_id", "series_en", "ep_fin"]),
                row(&["a", "Frieren", "3"]),
                row(&["b", "Mushishi", "0"]),
            ],
        );

        update_progress(&sheet, "Anime", "b", 12).await.unwrap();

        assert_eq!(sheet.cell("Anime", 3, 3), "12");
        assert_eq!(sheet.cell("Anime", 2, 3), "3");
        assert_eq!(
            sheet.calls(),
            vec![
                SheetCall::Read("Anime".into()),
                SheetCall::UpdateCell {
                    tab: "Anime".into(),
                    row: 3,
                    col: 3,
                    value: "12".into()
                }
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let sheet = MemorySheet::new().with_tab(
            "Anime",
            vec![row(&["system_id", "ep_fin"]), row(&["a", "1"])],
        );

        let err = update_progress(&sheet, "Anime", "zzz", 2).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(sheet.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ep_fin_header_is_config_error() {
        let sheet = MemorySheet::new().with_tab(
            "Anime",
            vec![row(&["system_id", "series_en"]), row(&["a", "Frieren"])],
        );

        let err = update_progress(&sheet, "Anime", "a", 2).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

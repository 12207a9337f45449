//! End-to-end pipeline tests against in-memory store, sheet, and metadata
//! doubles.

use std::time::Duration;

use anidex_core::mock::{MemoryEntryRepository, MemorySheet, SheetCall, StaticMetadataProvider};
use anidex_core::{
    AnimeEntry, EnrichmentResult, EntryRepository, Error, ItemOutcome, SkipReason, SyncReport,
};
use anidex_sheets::{RetryExecutor, RetryingSheetClient};
use anidex_sync::{SyncConfig, SyncEngine};
use tokio::time::Instant;

const PRIMARY: &str = "Anime";
const HUB: &str = "Franchise Hub";

const HEADER: &[&str] = &[
    "system_id",
    "series_en",
    "series_season_en",
    "series_season_cn",
    "series_season",
    "airing_type",
    "airing_status",
    "ep_total",
    "ep_fin",
    "mal_id",
    "mal_link",
    "studio",
    "mal_rating",
    "cover_image_url",
];

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

fn tab(data: &[&[&str]]) -> Vec<Vec<String>> {
    std::iter::once(row(HEADER))
        .chain(data.iter().map(|r| row(r)))
        .collect()
}

fn hub_header() -> Vec<Vec<String>> {
    vec![row(&[
        "system_id",
        "series_en",
        "series_roman",
        "series_cn",
        "rating_series",
        "alt_name",
    ])]
}

fn catalog_sheet() -> MemorySheet {
    MemorySheet::new()
        .with_tab(
            PRIMARY,
            tab(&[
                &[
                    "",
                    "Frieren",
                    "",
                    "",
                    "",
                    "TV",
                    "Finished Airing",
                    "28",
                    "10",
                    "",
                    "https://myanimelist.net/anime/52991/Sousou_no_Frieren",
                    "Madhouse",
                ],
                &[
                    "kaguya-s2",
                    "Kaguya",
                    "Kaguya-sama Season 2",
                    "",
                    "",
                    "TV",
                    "Finished Airing",
                    "12",
                    "12",
                    "40591",
                    "",
                    "A-1 Pictures",
                ],
                &[
                    "kaguya-movie",
                    "Kaguya",
                    "",
                    "",
                    "Film",
                    "Movie",
                    "Finished Airing",
                    "12",
                    "0",
                    "43608",
                ],
            ]),
        )
        .with_tab(HUB, hub_header())
}

fn provider() -> StaticMetadataProvider {
    let found = |cover: &str, rating: f64| {
        ItemOutcome::Done(EnrichmentResult {
            cover_image_url: Some(cover.to_string()),
            mal_rating: Some(rating),
        })
    };
    StaticMetadataProvider::new()
        .with_response(52991, found("https://cdn/frieren.jpg", 9.3))
        .with_response(40591, found("https://cdn/kaguya2.jpg", 8.6))
        .with_response(43608, ItemOutcome::Skipped(SkipReason::RateLimited))
}

fn engine(
    repo: &MemoryEntryRepository,
    sheet: &MemorySheet,
    metadata: &StaticMetadataProvider,
    config: SyncConfig,
) -> SyncEngine<MemoryEntryRepository, MemorySheet, StaticMetadataProvider> {
    SyncEngine::new(repo.clone(), sheet.clone(), metadata.clone(), config)
}

fn writes(sheet: &MemorySheet) -> Vec<SheetCall> {
    sheet
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, SheetCall::Read(_)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_full_run_creates_writes_back_and_enriches() {
    let repo = MemoryEntryRepository::new();
    let sheet = catalog_sheet();
    let metadata = provider();

    let report = engine(&repo, &sheet, &metadata, SyncConfig::default())
        .run()
        .await
        .unwrap();

    assert_eq!(
        report,
        SyncReport {
            created: 3,
            updated: 0,
            enriched: 2,
            patches_written: 5,
            hub_rows_added: 2,
        }
    );

    let records = repo.snapshot();
    let frieren = records
        .values()
        .find(|e| e.series_en.as_deref() == Some("Frieren"))
        .unwrap();
    assert_eq!(sheet.cell(PRIMARY, 2, 1), frieren.system_id);
    assert_eq!(frieren.mal_id, Some(52991));
    assert_eq!(frieren.series_season.as_deref(), Some("Season 1"));
    assert_eq!(frieren.cover_image_url.as_deref(), Some("https://cdn/frieren.jpg"));

    assert_eq!(sheet.cell(PRIMARY, 2, 10), "52991");
    assert_eq!(sheet.cell(PRIMARY, 2, 5), "Season 1");
    assert_eq!(sheet.cell(PRIMARY, 3, 5), "Season 2");
    assert_eq!(sheet.cell(PRIMARY, 4, 8), "1");
    assert_eq!(records["kaguya-movie"].ep_total, Some(1));
    assert_eq!(records["kaguya-movie"].cover_image_url, None);

    let hub = sheet.rows(HUB);
    assert_eq!(hub.len(), 3);
    assert_eq!(hub[1][1], "Frieren");
    assert_eq!(hub[2][1], "Kaguya");
    assert!(!hub[1][0].is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_run_on_unchanged_sheet_creates_nothing() {
    let repo = MemoryEntryRepository::new();
    let sheet = catalog_sheet();
    let metadata = provider();
    let engine = engine(&repo, &sheet, &metadata, SyncConfig::default());

    engine.run().await.unwrap();
    let ids_after_first: Vec<String> = repo.snapshot().keys().cloned().collect();
    sheet.clear_calls();

    let second = engine.run().await.unwrap();

    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 3);
    assert_eq!(second.patches_written, 0);
    assert_eq!(second.hub_rows_added, 0);
    assert!(writes(&sheet).is_empty());
    let ids_after_second: Vec<String> = repo.snapshot().keys().cloned().collect();
    assert_eq!(ids_after_first, ids_after_second);
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_rolls_back_every_record() {
    let repo = MemoryEntryRepository::new();
    repo.fail_writes_for("kaguya-movie");
    let sheet = catalog_sheet();
    let metadata = provider();

    let result = engine(&repo, &sheet, &metadata, SyncConfig::default())
        .run()
        .await;

    assert!(matches!(result, Err(Error::Internal(_))));
    assert!(repo.snapshot().is_empty());
    assert_eq!(repo.commit_count(), 0);
    assert!(metadata.calls().is_empty());
    // Hub appends go out before reconciliation and are not undone.
    assert_eq!(
        writes(&sheet),
        vec![SheetCall::Append {
            tab: HUB.into(),
            rows: 2
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_commit_failure_keeps_sheet_ids_for_next_run() {
    let repo = MemoryEntryRepository::new();
    repo.fail_commits(1);
    let sheet = catalog_sheet();
    let metadata = provider();
    let engine = engine(&repo, &sheet, &metadata, SyncConfig::default());

    let result = engine.run().await;

    assert!(matches!(result, Err(Error::Internal(_))));
    assert!(repo.snapshot().is_empty());
    assert_eq!(repo.commit_count(), 0);
    assert!(metadata.calls().is_empty());
    // Patches were flushed before the commit, so the sheet keeps the minted id.
    let minted = sheet.cell(PRIMARY, 2, 1);
    assert!(!minted.is_empty());
    assert_eq!(sheet.cell(PRIMARY, 2, 10), "52991");
    assert_eq!(sheet.rows(HUB).len(), 3);

    sheet.clear_calls();
    let report = engine.run().await.unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(report.patches_written, 0);
    assert_eq!(report.hub_rows_added, 0);
    assert!(writes(&sheet).is_empty());
    let records = repo.snapshot();
    assert!(records.contains_key(&minted));
    assert_eq!(records[&minted].series_en.as_deref(), Some("Frieren"));
    assert_eq!(sheet.cell(PRIMARY, 2, 1), minted);
}

#[tokio::test(start_paused = true)]
async fn test_missing_required_header_aborts_before_any_write() {
    let repo = MemoryEntryRepository::new();
    let sheet = MemorySheet::new()
        .with_tab(
            PRIMARY,
            vec![
                row(&["system_id", "series_en", "series_season", "airing_type", "mal_id"]),
                row(&["", "Frieren", "", "TV", ""]),
            ],
        )
        .with_tab(HUB, hub_header());
    let metadata = provider();

    let result = engine(&repo, &sheet, &metadata, SyncConfig::default())
        .run()
        .await;

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("ep_total")),
        other => panic!("expected Config error, got {:?}", other),
    }
    assert!(writes(&sheet).is_empty());
    assert_eq!(repo.commit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sticky_fields_survive_blank_cells() {
    let repo = MemoryEntryRepository::new().with_entry(AnimeEntry {
        system_id: "a".into(),
        series_en: Some("Frieren".into()),
        studio: Some("Old Studio".into()),
        cover_image_url: Some("X".into()),
        mal_rating: Some(9.0),
        ..Default::default()
    });
    let sheet = MemorySheet::new()
        .with_tab(
            PRIMARY,
            tab(&[&["a", "Frieren", "", "", "Season 1", "TV", "", "28", "", "52991"]]),
        )
        .with_tab(HUB, hub_header());
    let metadata = provider();

    let report = engine(
        &repo,
        &sheet,
        &metadata,
        SyncConfig::default().with_enrichment(false),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.updated, 1);
    let record = repo.get("a").await.unwrap().unwrap();
    assert_eq!(record.cover_image_url.as_deref(), Some("X"));
    assert_eq!(record.mal_rating, Some(9.0));
    assert_eq!(record.studio, None);
    assert!(metadata.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_quota_failures_are_retried_with_backoff() {
    let repo = MemoryEntryRepository::new();
    let sheet = catalog_sheet();
    sheet.fail_with_quota(2);
    let metadata = provider();
    let engine = SyncEngine::new(
        repo.clone(),
        RetryingSheetClient::new(sheet.clone(), RetryExecutor::default()),
        metadata.clone(),
        SyncConfig::default().with_enrichment(false),
    );

    let start = Instant::now();
    let report = engine.run().await.unwrap();

    assert_eq!(report.created, 3);
    assert!(Instant::now() - start >= Duration::from_secs(180));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retry_budget_aborts_run() {
    let repo = MemoryEntryRepository::new();
    let sheet = catalog_sheet();
    sheet.fail_with_quota(3);
    let engine = SyncEngine::new(
        repo.clone(),
        RetryingSheetClient::new(sheet.clone(), RetryExecutor::default()),
        provider(),
        SyncConfig::default(),
    );

    match engine.run().await {
        Err(Error::RetryBudgetExhausted {
            operation,
            attempts,
        }) => {
            assert_eq!(operation, "read_rows(Anime)");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RetryBudgetExhausted, got {:?}", other),
    }
    assert_eq!(repo.commit_count(), 0);
}

#[tokio::test]
async fn test_progress_write_back_through_engine() {
    let repo = MemoryEntryRepository::new();
    let sheet = catalog_sheet();
    let engine = engine(&repo, &sheet, &provider(), SyncConfig::default());

    engine.update_progress("kaguya-s2", 11).await.unwrap();

    assert_eq!(sheet.cell(PRIMARY, 3, 9), "11");
    assert!(matches!(
        engine.update_progress("missing", 1).await,
        Err(Error::NotFound(_))
    ));
}

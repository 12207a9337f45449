//! Route handlers.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use anidex_core::{AnimeEntry, EntryRepository, MetadataProvider, SheetClient, SyncReport};

use crate::{ApiError, AppState};

/// Body of `PATCH /api/anime/:system_id/progress`.
#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub ep_fin: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressResponse {
    pub system_id: String,
    pub ep_fin: i32,
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "anidex is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_anime<R, C, P>(
    State(state): State<AppState<R, C, P>>,
) -> Result<Json<Vec<AnimeEntry>>, ApiError>
where
    R: EntryRepository,
    C: SheetClient,
    P: MetadataProvider,
{
    let entries = state.engine.repo().list().await?;
    Ok(Json(entries))
}

pub async fn get_anime<R, C, P>(
    State(state): State<AppState<R, C, P>>,
    Path(system_id): Path<String>,
) -> Result<Json<AnimeEntry>, ApiError>
where
    R: EntryRepository,
    C: SheetClient,
    P: MetadataProvider,
{
    state
        .engine
        .repo()
        .get(&system_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Anime {} not found", system_id)))
}

pub async fn trigger_sync<R, C, P>(
    State(state): State<AppState<R, C, P>>,
) -> Result<Json<SyncReport>, ApiError>
where
    R: EntryRepository,
    C: SheetClient,
    P: MetadataProvider,
{
    let _guard = state.sync_lock.lock().await;
    info!(subsystem = "api", op = "sync", "Sync triggered");
    let report = state.engine.run().await?;
    Ok(Json(report))
}

pub async fn update_progress<R, C, P>(
    State(state): State<AppState<R, C, P>>,
    Path(system_id): Path<String>,
    Json(body): Json<ProgressUpdate>,
) -> Result<Json<ProgressResponse>, ApiError>
where
    R: EntryRepository,
    C: SheetClient,
    P: MetadataProvider,
{
    if body.ep_fin < 0 {
        return Err(ApiError::BadRequest("ep_fin must not be negative".into()));
    }
    state
        .engine
        .update_progress(&system_id, body.ep_fin)
        .await?;
    Ok(Json(ProgressResponse {
        system_id,
        ep_fin: body.ep_fin,
    }))
}

//! # anidex-api
//!
//! HTTP surface for the anidex catalog: read-only listing, the sync trigger,
//! and progress write-back.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tokio::sync::Mutex;

use anidex_core::{EntryRepository, MetadataProvider, SheetClient};
use anidex_sync::SyncEngine;

pub use error::ApiError;

/// Shared handler state.
pub struct AppState<R, C, P> {
    pub engine: Arc<SyncEngine<R, C, P>>,
    /// Held for the length of a sync run; concurrent triggers queue.
    pub sync_lock: Arc<Mutex<()>>,
}

impl<R, C, P> AppState<R, C, P> {
    pub fn new(engine: SyncEngine<R, C, P>) -> Self {
        Self {
            engine: Arc::new(engine),
            sync_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl<R, C, P> Clone for AppState<R, C, P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            sync_lock: Arc::clone(&self.sync_lock),
        }
    }
}

/// Build the application router.
pub fn router<R, C, P>(state: AppState<R, C, P>) -> Router
where
    R: EntryRepository + 'static,
    C: SheetClient + 'static,
    P: MetadataProvider + 'static,
{
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/anime", get(handlers::list_anime::<R, C, P>))
        .route("/api/anime/:system_id", get(handlers::get_anime::<R, C, P>))
        .route(
            "/api/anime/:system_id/progress",
            patch(handlers::update_progress::<R, C, P>),
        )
        .route("/api/sync", post(handlers::trigger_sync::<R, C, P>))
        .with_state(state)
}

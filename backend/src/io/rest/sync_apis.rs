//! # REST API for Sync
//!
//! `GET` reports whether there are unsynced local changes, `POST` pushes the
//! ledger to the configured remote. A failed push is answered with an error
//! status but nothing is lost: the changes stay saved locally.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::io::rest::error_response;
use crate::AppState;
use shared::{SyncResponse, SyncStatusResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_sync_status).post(sync_now))
}

pub async fn get_sync_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/sync");
    Json(SyncStatusResponse {
        dirty: state.ledger.is_dirty(),
        last_synced_at: state.ledger.last_synced_at(),
    })
}

pub async fn sync_now(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/sync");

    match state.ledger.sync().await {
        Ok(synced_at) => Json(SyncResponse {
            synced: true,
            dirty: state.ledger.is_dirty(),
            message: format!("Synced at {}", synced_at.to_rfc3339()),
        })
        .into_response(),
        Err(e) => error_response("Sync failed, changes saved locally", e.into()),
    }
}

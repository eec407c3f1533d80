//! # REST API for Allotments
//!
//! Confirm and revoke. The group-scoped register and candidate lists live
//! under `/api/chits/:id`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error_response;
use crate::io::rest::mappers::AllotmentMapper;
use crate::AppState;
use shared::ConfirmAllotmentRequest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_allotments).post(confirm_allotment))
        .route("/:id/revoke", post(revoke_allotment))
}

#[derive(Deserialize, Debug)]
pub struct AllotmentListQuery {
    pub chit_group_id: Option<String>,
}

pub async fn list_allotments(
    State(state): State<AppState>,
    Query(query): Query<AllotmentListQuery>,
) -> impl IntoResponse {
    info!("GET /api/allotments - query: {:?}", query);
    match query.chit_group_id {
        Some(group_id) => Json(state.ledger.allotment_register(&group_id)),
        None => Json(state.ledger.allotments()),
    }
}

pub async fn confirm_allotment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmAllotmentRequest>,
) -> impl IntoResponse {
    info!("POST /api/allotments - request: {:?}", request);

    match state.ledger.confirm_allotment(AllotmentMapper::to_confirm_command(request)) {
        Ok(allotment) => (StatusCode::CREATED, Json(allotment)).into_response(),
        Err(e) => error_response("Failed to confirm allotment", e.into()),
    }
}

pub async fn revoke_allotment(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("POST /api/allotments/{}/revoke", id);

    match AllotmentMapper::to_revoke_response(state.ledger.revoke_allotment(&id)) {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Allotment not found: {}", id)).into_response(),
    }
}

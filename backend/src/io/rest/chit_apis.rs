//! # REST API for Chit Groups
//!
//! Creating and listing groups, plus the group-scoped allotment views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::domain::models::ChitGroupValidationError;
use crate::io::rest::error_response;
use crate::io::rest::mappers::ChitMapper;
use crate::AppState;
use shared::CreateChitGroupRequest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chit_groups).post(create_chit_group))
        .route("/:id", get(get_chit_group))
        .route("/:id/allotments", get(get_allotment_register))
        .route("/:id/candidates", get(get_allotment_candidates))
}

pub async fn list_chit_groups(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/chits");
    Json(state.ledger.chit_groups())
}

pub async fn create_chit_group(
    State(state): State<AppState>,
    Json(request): Json<CreateChitGroupRequest>,
) -> impl IntoResponse {
    info!("POST /api/chits - request: {:?}", request);

    match state.ledger.create_chit_group(ChitMapper::to_create_command(request)) {
        Ok(group) => (StatusCode::CREATED, Json(group)).into_response(),
        Err(e) => error_response("Failed to create chit group", e.into()),
    }
}

pub async fn get_chit_group(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/chits/{}", id);

    match state.ledger.chit_group(&id) {
        Some(group) => Json(group).into_response(),
        None => error_response("Chit group lookup", ChitGroupValidationError::NotFound(id).into()),
    }
}

pub async fn get_allotment_register(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/chits/{}/allotments", id);

    if state.ledger.chit_group(&id).is_none() {
        return error_response("Allotment register", ChitGroupValidationError::NotFound(id).into());
    }
    Json(state.ledger.allotment_register(&id)).into_response()
}

pub async fn get_allotment_candidates(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/chits/{}/candidates", id);

    if state.ledger.chit_group(&id).is_none() {
        return error_response("Allotment candidates", ChitGroupValidationError::NotFound(id).into());
    }
    Json(state.ledger.allotment_candidates(&id)).into_response()
}

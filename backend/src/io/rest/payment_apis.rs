//! # REST API for Payments and Schedules

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error_response;
use crate::io::rest::mappers::PaymentMapper;
use crate::AppState;
use shared::RecordPaymentRequest;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_payments).post(record_payment))
}

pub fn schedule_router() -> Router<AppState> {
    Router::new().route("/", get(get_schedule))
}

#[derive(Deserialize, Debug)]
pub struct PaymentListQuery {
    pub chit_group_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ScheduleQuery {
    pub chit_group_id: String,
    pub member_id: String,
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> impl IntoResponse {
    info!("GET /api/payments - query: {:?}", query);
    Json(state.ledger.payments(query.chit_group_id.as_deref()))
}

pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    info!("POST /api/payments - request: {:?}", request);

    match state.ledger.record_payment(PaymentMapper::to_record_command(request)) {
        Ok(outcome) => (StatusCode::CREATED, Json(PaymentMapper::to_record_response(outcome))).into_response(),
        Err(e) => error_response("Failed to record payment", e.into()),
    }
}

pub async fn get_schedule(State(state): State<AppState>, Query(query): Query<ScheduleQuery>) -> impl IntoResponse {
    info!("GET /api/schedules - query: {:?}", query);
    Json(state.ledger.schedule_for(&query.chit_group_id, &query.member_id))
}

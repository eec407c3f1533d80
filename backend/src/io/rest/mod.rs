//! # REST API
//!
//! One module per resource, each exposing a `router()` that is nested under
//! `/api`:
//!
//! | Prefix              | Module            |
//! |---------------------|-------------------|
//! | `/api/chits`        | [`chit_apis`]       |
//! | `/api/members`      | [`member_apis`]     |
//! | `/api/memberships`  | [`member_apis`]     |
//! | `/api/schedules`    | [`payment_apis`]    |
//! | `/api/payments`     | [`payment_apis`]    |
//! | `/api/allotments`   | [`allotment_apis`]  |
//! | `/api/reports`      | [`report_apis`]     |
//! | `/api/sync`         | [`sync_apis`]       |
//!
//! Errors are answered as plain text. The status code comes from the typed
//! domain error found in the error chain: validation failures are `400`,
//! unknown groups and members `404`, allotment conflicts `409`. Sync maps
//! an unavailable remote to `503`, a push still running to `409`, a timeout
//! to `504` and a refused push to `502`. Anything else is `500`.

pub mod allotment_apis;
pub mod chit_apis;
pub mod mappers;
pub mod member_apis;
pub mod payment_apis;
pub mod report_apis;
pub mod sync_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tracing::{error, warn};

use crate::domain::models::{
    AllotmentError, ChitGroupValidationError, MemberValidationError, PaymentValidationError,
    SyncError,
};
use crate::domain::NotificationError;
use crate::AppState;

/// All API routes, to be nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/chits", chit_apis::router())
        .nest("/members", member_apis::router())
        .nest("/memberships", member_apis::membership_router())
        .nest("/schedules", payment_apis::schedule_router())
        .nest("/payments", payment_apis::router())
        .nest("/allotments", allotment_apis::router())
        .nest("/reports", report_apis::router())
        .nest("/sync", sync_apis::router())
}

/// Status code for an error, from the first typed domain error found.
pub fn status_for(error: &anyhow::Error) -> StatusCode {
    if let Some(e) = error.downcast_ref::<ChitGroupValidationError>() {
        return match e {
            ChitGroupValidationError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = error.downcast_ref::<MemberValidationError>() {
        return match e {
            MemberValidationError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if error.downcast_ref::<PaymentValidationError>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(e) = error.downcast_ref::<AllotmentError>() {
        return match e {
            AllotmentError::GroupNotFound(_) | AllotmentError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            AllotmentError::MemberAlreadyAllotted { .. } | AllotmentError::MonthAlreadyAllotted { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = error.downcast_ref::<NotificationError>() {
        return match e {
            NotificationError::GroupNotFound(_) | NotificationError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            NotificationError::NothingDue(_) | NotificationError::NothingPaid(_) => StatusCode::CONFLICT,
        };
    }
    if let Some(e) = error.downcast_ref::<SyncError>() {
        return match e {
            SyncError::NoRemote | SyncError::Offline => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::InFlight => StatusCode::CONFLICT,
            SyncError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            SyncError::Rejected(_) => StatusCode::BAD_GATEWAY,
        };
    }
    if error.downcast_ref::<csv::Error>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Log an error and turn it into a plain-text response.
pub fn error_response(context: &str, error: anyhow::Error) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!("{}: {:#}", context, error);
    } else {
        warn!("{}: {:#}", context, error);
    }
    (status, format!("{:#}", error)).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::domain::{ChitLedger, NotificationService, WhatsAppNotifier};
    use crate::storage::{MemoryStorage, RemoteStore};
    use crate::{create_router, AppState};

    pub fn test_state(remote: Option<Arc<dyn RemoteStore>>) -> AppState {
        let ledger = ChitLedger::open(Arc::new(MemoryStorage::new()), remote, Duration::from_secs(5));
        AppState::new(ledger, NotificationService::new(Arc::new(WhatsAppNotifier::new())))
    }

    pub fn test_app(state: &AppState) -> Router {
        create_router(state.clone())
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get_json<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, Option<T>) {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).ok())
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        app: &Router,
        uri: &str,
        body: &B,
    ) -> (StatusCode, Option<T>) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).ok())
    }
}

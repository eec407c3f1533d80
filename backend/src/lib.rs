//! # Chit Ledger Backend
//!
//! Ledger and allotment engine for chit fund groups, with local-first
//! persistence and an HTTP API.
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (ledger store, schedule/payment/allotment engines, reports)
//!     ↓
//! Storage Layer (JSON snapshot file, remote mirrors)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{ChitLedger, NotificationService, WhatsAppNotifier};
use crate::storage::{JsonConnection, SnapshotRepository};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub ledger: ChitLedger,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(ledger: ChitLedger, notification_service: NotificationService) -> Self {
        Self {
            ledger,
            notification_service,
        }
    }
}

/// Load config and ledger from the data directory.
pub fn initialize_backend(data_directory: &Path) -> Result<(AppConfig, AppState)> {
    info!("Using data directory {:?}", data_directory);
    let connection = JsonConnection::new(data_directory)?;
    let config = AppConfig::load_or_create(&connection)?;

    info!("Loading ledger");
    let storage = SnapshotRepository::with_files(connection, &config.snapshot_file, &config.last_sync_file);
    let remote = config.build_remote(data_directory);
    let ledger = ChitLedger::open(Arc::new(storage), remote, config.sync_timeout());

    let notification_service = NotificationService::new(Arc::new(WhatsAppNotifier::new()));
    Ok((config, AppState::new(ledger, notification_service)))
}

/// Build the router with every API mounted under `/api`.
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost:8080"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .with_state(app_state)
}

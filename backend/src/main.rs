use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use chit_ledger_backend::config::resolve_data_directory;
use chit_ledger_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let data_directory = resolve_data_directory()?;
    let (config, app_state) = initialize_backend(&data_directory)?;
    let ledger = app_state.ledger.clone();

    tokio::spawn(log_dirty_changes(ledger.subscribe()));

    let app = create_router(app_state);
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if ledger.is_dirty() && ledger.has_remote() {
        info!("Pushing unsynced changes before exit");
        if let Err(e) = ledger.sync().await {
            warn!("Final sync failed, changes remain saved locally: {}", e);
        }
    }
    Ok(())
}

async fn log_dirty_changes(mut dirty: watch::Receiver<bool>) {
    while dirty.changed().await.is_ok() {
        if *dirty.borrow_and_update() {
            debug!("Ledger has unsynced changes");
        } else {
            info!("Ledger is in sync with the remote");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

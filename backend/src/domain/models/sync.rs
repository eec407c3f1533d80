use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No remote store is configured")]
    NoRemote,
    #[error("Remote store is offline, changes are saved locally")]
    Offline,
    #[error("A sync is already in progress")]
    InFlight,
    #[error("Remote push timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Remote push failed: {0}")]
    Rejected(String),
}

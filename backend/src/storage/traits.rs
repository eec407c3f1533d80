//! # Storage Traits
//!
//! The ledger never talks to a storage medium directly. Local persistence
//! goes through [`SnapshotStorage`], the optional remote mirror through
//! [`RemoteStore`], so the file store, the in-memory store and the remotes
//! can be swapped without touching the mutation path.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::LedgerSnapshot;

/// Durable local slot holding the whole snapshot, plus a separate slot for
/// the last successful sync time.
pub trait SnapshotStorage: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet. An unreadable document
    /// is an error; the caller decides how to recover.
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>>;

    /// Replace the stored snapshot.
    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()>;

    fn load_last_sync(&self) -> Result<Option<DateTime<Utc>>>;

    fn save_last_sync(&self, synced_at: DateTime<Utc>) -> Result<()>;
}

/// Push target for the eventually consistent remote copy.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Connectivity as currently reported. A sync is not attempted while
    /// this is false.
    fn is_online(&self) -> bool;

    /// Push the full snapshot and wait for the acknowledgement.
    async fn push(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}

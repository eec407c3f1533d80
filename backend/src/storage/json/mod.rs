//! # JSON File Storage
//!
//! File-backed [`SnapshotStorage`](crate::storage::traits::SnapshotStorage)
//! rooted in the application data directory. Every write goes through a temp
//! file and a rename so a crash never leaves a half-written snapshot.

pub mod connection;
pub mod snapshot_repository;

pub use connection::JsonConnection;
pub use snapshot_repository::{SnapshotRepository, DEFAULT_LAST_SYNC_FILE, DEFAULT_SNAPSHOT_FILE};

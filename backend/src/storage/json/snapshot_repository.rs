//! # JSON Snapshot Repository
//!
//! Keeps the whole ledger in one pretty-printed JSON document and the last
//! sync time in a second, plain-text file next to it.
//!
//! ```text
//! data/
//! ├── chit_ledger.yaml     ← application config
//! ├── ledger_snapshot.json ← this module
//! └── last_sync.txt        ← this module (RFC 3339 timestamp)
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::connection::JsonConnection;
use crate::domain::models::LedgerSnapshot;
use crate::storage::traits::SnapshotStorage;

pub const DEFAULT_SNAPSHOT_FILE: &str = "ledger_snapshot.json";
pub const DEFAULT_LAST_SYNC_FILE: &str = "last_sync.txt";

#[derive(Clone)]
pub struct SnapshotRepository {
    connection: JsonConnection,
    snapshot_file: String,
    last_sync_file: String,
}

impl SnapshotRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self::with_files(connection, DEFAULT_SNAPSHOT_FILE, DEFAULT_LAST_SYNC_FILE)
    }

    pub fn with_files(connection: JsonConnection, snapshot_file: &str, last_sync_file: &str) -> Self {
        Self {
            connection,
            snapshot_file: snapshot_file.to_string(),
            last_sync_file: last_sync_file.to_string(),
        }
    }
}

impl SnapshotStorage for SnapshotRepository {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        let Some(content) = self.connection.read_file(&self.snapshot_file)? else {
            debug!("No snapshot stored at {:?}", self.connection.file_path(&self.snapshot_file));
            return Ok(None);
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Snapshot {} is not valid ledger JSON", self.snapshot_file))?;
        Ok(Some(snapshot))
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        self.connection.write_file_atomic(&self.snapshot_file, &json)
    }

    fn load_last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        match self.connection.read_file(&self.last_sync_file)? {
            Some(text) if !text.trim().is_empty() => {
                let parsed = DateTime::parse_from_rfc3339(text.trim())
                    .with_context(|| format!("Invalid last sync timestamp: {}", text.trim()))?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            _ => Ok(None),
        }
    }

    fn save_last_sync(&self, synced_at: DateTime<Utc>) -> Result<()> {
        self.connection
            .write_file_atomic(&self.last_sync_file, &synced_at.to_rfc3339())?;
        info!("Recorded last sync at {}", synced_at);
        Ok(())
    }
}

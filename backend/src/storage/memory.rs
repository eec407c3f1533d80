//! In-process snapshot storage.
//!
//! Holds the serialized document rather than the struct so that a stored
//! value goes through the same JSON round trip as the file store, and so a
//! corrupt slot can be simulated.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::domain::models::LedgerSnapshot;
use crate::storage::traits::SnapshotStorage;

#[derive(Default)]
pub struct MemoryStorage {
    document: Mutex<Option<String>>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw slot contents, valid or not.
    pub fn with_document(document: &str) -> Self {
        let storage = Self::default();
        *storage.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document.to_string());
        storage
    }

    /// Make every following save fail, as a full disk would.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn document(&self) -> Option<String> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        match self.document() {
            Some(text) if !text.trim().is_empty() => Ok(Some(serde_json::from_str(&text)?)),
            _ => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("memory storage is refusing writes"));
        }
        let json = serde_json::to_string(snapshot)?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.last_sync.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save_last_sync(&self, synced_at: DateTime<Utc>) -> Result<()> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner) = Some(synced_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_json() {
        let storage = MemoryStorage::new();
        assert!(storage.load_snapshot().unwrap().is_none());

        storage.save_snapshot(&LedgerSnapshot::seeded()).unwrap();
        assert_eq!(storage.load_snapshot().unwrap(), Some(LedgerSnapshot::seeded()));
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn test_failing_saves_leave_previous_document() {
        let storage = MemoryStorage::with_document("{}");
        storage.set_fail_saves(true);

        assert!(storage.save_snapshot(&LedgerSnapshot::seeded()).is_err());
        assert_eq!(storage.document().as_deref(), Some("{}"));
        assert_eq!(storage.save_count(), 0);
    }
}

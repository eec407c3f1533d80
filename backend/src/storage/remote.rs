//! Simulated remote store.
//!
//! Stands in for a cloud backend: waits a configurable latency, then
//! accepts or rejects the push. Connectivity and failure can be flipped at
//! runtime.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::models::LedgerSnapshot;
use crate::storage::traits::RemoteStore;

pub struct SimulatedRemote {
    latency: Duration,
    online: AtomicBool,
    reject: AtomicBool,
    pushes: AtomicUsize,
    last_pushed: Mutex<Option<LedgerSnapshot>>,
}

impl SimulatedRemote {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            online: AtomicBool::new(true),
            reject: AtomicBool::new(false),
            pushes: AtomicUsize::new(0),
            last_pushed: Mutex::new(None),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Reject every following push after the latency has elapsed.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Number of accepted pushes
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn last_pushed(&self) -> Option<LedgerSnapshot> {
        self.last_pushed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl RemoteStore for SimulatedRemote {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn push(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        debug!("Simulated push of {} chits, waiting {:?}", snapshot.chits.len(), self.latency);
        tokio::time::sleep(self.latency).await;

        if self.reject.load(Ordering::SeqCst) {
            bail!("simulated remote rejected the snapshot");
        }
        *self.last_pushed.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        let count = self.pushes.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Simulated remote accepted push #{}", count);
        Ok(())
    }
}

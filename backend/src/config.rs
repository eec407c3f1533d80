//! # Application Configuration
//!
//! `chit_ledger.yaml` at the root of the data directory. A default file is
//! written on first start so there is always something to edit.
//!
//! ```yaml
//! bind_address: 127.0.0.1:3000
//! snapshot_file: ledger_snapshot.json
//! last_sync_file: last_sync.txt
//! sync_timeout_secs: 30
//! remote:
//!   kind: git            # none | simulated | git
//!   mirror_directory: /path/to/Dropbox/chit-ledger
//!   latency_ms: 500      # simulated only
//!   online: true         # simulated only
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::DEFAULT_SYNC_TIMEOUT;
use crate::storage::json::{JsonConnection, DEFAULT_LAST_SYNC_FILE, DEFAULT_SNAPSHOT_FILE};
use crate::storage::{GitMirrorRemote, RemoteStore, SimulatedRemote};

pub const CONFIG_FILE: &str = "chit_ledger.yaml";
pub const DATA_DIR_ENV: &str = "CHIT_LEDGER_DATA_DIR";
const DATA_DIR_NAME: &str = "Chit Ledger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// Local only, sync always reports that no remote is configured
    #[default]
    None,
    Simulated,
    Git,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub kind: RemoteKind,
    /// Git mirror location; `<data dir>/mirror` when unset
    pub mirror_directory: Option<PathBuf>,
    pub latency_ms: u64,
    pub online: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            kind: RemoteKind::None,
            mirror_directory: None,
            latency_ms: 500,
            online: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub snapshot_file: String,
    pub last_sync_file: String,
    pub sync_timeout_secs: u64,
    pub remote: RemoteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            last_sync_file: DEFAULT_LAST_SYNC_FILE.to_string(),
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT.as_secs(),
            remote: RemoteConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the config from the data directory, writing the defaults when
    /// the file does not exist yet.
    pub fn load_or_create(connection: &JsonConnection) -> Result<Self> {
        match connection.read_file(CONFIG_FILE)? {
            Some(yaml) => {
                let config: AppConfig = serde_yaml::from_str(&yaml)?;
                debug!("Loaded config from {:?}", connection.file_path(CONFIG_FILE));
                Ok(config)
            }
            None => {
                let config = AppConfig::default();
                connection.write_file_atomic(CONFIG_FILE, &serde_yaml::to_string(&config)?)?;
                info!("Created default config at {:?}", connection.file_path(CONFIG_FILE));
                Ok(config)
            }
        }
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs.max(1))
    }

    /// Build the configured remote, if any.
    pub fn build_remote(&self, data_directory: &Path) -> Option<Arc<dyn RemoteStore>> {
        match self.remote.kind {
            RemoteKind::None => None,
            RemoteKind::Simulated => {
                let remote = SimulatedRemote::new(Duration::from_millis(self.remote.latency_ms));
                remote.set_online(self.remote.online);
                Some(Arc::new(remote))
            }
            RemoteKind::Git => {
                let directory = self
                    .remote
                    .mirror_directory
                    .clone()
                    .unwrap_or_else(|| data_directory.join("mirror"));
                info!("Mirroring ledger to git repository at {:?}", directory);
                Some(Arc::new(GitMirrorRemote::new(directory)))
            }
        }
    }
}

/// Data directory: `$CHIT_LEDGER_DATA_DIR`, else `Documents/Chit Ledger`
/// under the user's home.
pub fn resolve_data_directory() -> Result<PathBuf> {
    data_directory_from(
        std::env::var(DATA_DIR_ENV).ok(),
        std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok()),
    )
}

fn data_directory_from(override_dir: Option<String>, home: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| anyhow!("Cannot locate a home directory; set {}", DATA_DIR_ENV))?;
    Ok(PathBuf::from(home).join("Documents").join(DATA_DIR_NAME))
}

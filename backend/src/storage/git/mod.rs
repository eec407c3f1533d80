//! # Git Mirror Remote
//!
//! A [`RemoteStore`] that mirrors the snapshot into a local git repository,
//! typically inside a folder that another tool replicates (a cloud drive, a
//! USB stick). Every push writes the snapshot file and commits it, so the
//! mirror keeps a full history of the ledger.
//!
//! The mirror counts as online while the folder that holds it is reachable.
//! A push whose content matches the current head creates no commit.

use anyhow::Result;
use async_trait::async_trait;
use git2::{Commit, ErrorCode, Repository, Signature};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::models::LedgerSnapshot;
use crate::storage::json::connection::write_atomic;
use crate::storage::traits::RemoteStore;

pub const MIRROR_FILE: &str = "ledger_snapshot.json";

/// Local repository operations used by the mirror
#[derive(Clone)]
pub struct GitManager {
    author_name: String,
    author_email: String,
}

impl GitManager {
    pub fn new() -> Self {
        Self {
            author_name: "Chit Ledger".to_string(),
            author_email: "ledger@chit.local".to_string(),
        }
    }

    pub fn with_author(author_name: String, author_email: String) -> Self {
        Self {
            author_name,
            author_email,
        }
    }

    /// Open the repository at `repo_path`, initializing it when missing.
    pub fn ensure_repo_exists<P: AsRef<Path>>(&self, repo_path: P) -> Result<Repository> {
        let repo_path = repo_path.as_ref();
        match Repository::open(repo_path) {
            Ok(repo) => Ok(repo),
            Err(_) => {
                std::fs::create_dir_all(repo_path)?;
                let repo = Repository::init(repo_path)?;
                info!("Initialized mirror repository at {:?}", repo_path);
                Ok(repo)
            }
        }
    }

    /// Write `content` to `file_name` inside the repository and commit it.
    /// Returns the id of the head commit afterwards.
    pub fn commit_file_change<P: AsRef<Path>>(
        &self,
        repo_path: P,
        file_name: &str,
        content: &str,
        message: &str,
    ) -> Result<String> {
        let repo_path = repo_path.as_ref();
        let repo = self.ensure_repo_exists(repo_path)?;
        write_atomic(&repo_path.join(file_name), content)?;

        let mut index = repo.index()?;
        index.add_path(Path::new(file_name))?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                debug!("Mirror already at this snapshot, no commit");
                return Ok(parent.id().to_string());
            }
        }

        let signature = Signature::now(&self.author_name, &self.author_email)?;
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!("Committed {} to mirror {:?}: {}", file_name, repo_path, oid);
        Ok(oid.to_string())
    }

    pub fn is_git_repository<P: AsRef<Path>>(&self, repo_path: P) -> bool {
        Repository::open(repo_path.as_ref()).is_ok()
    }
}

impl Default for GitManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct GitMirrorRemote {
    mirror_directory: PathBuf,
    git_manager: GitManager,
}

impl GitMirrorRemote {
    pub fn new<P: AsRef<Path>>(mirror_directory: P) -> Self {
        Self {
            mirror_directory: mirror_directory.as_ref().to_path_buf(),
            git_manager: GitManager::new(),
        }
    }

    pub fn mirror_directory(&self) -> &Path {
        &self.mirror_directory
    }
}

#[async_trait]
impl RemoteStore for GitMirrorRemote {
    fn is_online(&self) -> bool {
        match self.mirror_directory.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.exists(),
            _ => true,
        }
    }

    async fn push(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        let message = format!(
            "Ledger snapshot: {} chits, {} members, {} payments",
            snapshot.chits.len(),
            snapshot.members.len(),
            snapshot.payments.len()
        );
        let manager = self.git_manager.clone();
        let directory = self.mirror_directory.clone();

        // git2 is blocking
        tokio::task::spawn_blocking(move || {
            manager.commit_file_change(&directory, MIRROR_FILE, &content, &message)
        })
        .await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commit_count(path: &Path) -> usize {
        let repo = Repository::open(path).unwrap();
        let mut walk = repo.revwalk().unwrap();
        walk.push_head().unwrap();
        walk.count()
    }

    #[test]
    fn test_commit_creates_repository() {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().join("mirror");
        let manager = GitManager::new();

        assert!(!manager.is_git_repository(&repo_path));
        manager
            .commit_file_change(&repo_path, MIRROR_FILE, "{}", "first")
            .unwrap();

        assert!(manager.is_git_repository(&repo_path));
        assert_eq!(commit_count(&repo_path), 1);
    }

    #[test]
    fn test_unchanged_content_does_not_commit() {
        let temp_dir = TempDir::new().unwrap();
        let manager = GitManager::with_author("Tester".to_string(), "t@example.com".to_string());

        let first = manager
            .commit_file_change(temp_dir.path(), MIRROR_FILE, "{}", "first")
            .unwrap();
        let again = manager
            .commit_file_change(temp_dir.path(), MIRROR_FILE, "{}", "again")
            .unwrap();
        manager
            .commit_file_change(temp_dir.path(), MIRROR_FILE, "{\"users\":[]}", "changed")
            .unwrap();

        assert_eq!(first, again);
        assert_eq!(commit_count(temp_dir.path()), 2);
    }

    #[tokio::test]
    async fn test_mirror_push() {
        let temp_dir = TempDir::new().unwrap();
        let remote = GitMirrorRemote::new(temp_dir.path().join("mirror"));
        assert!(remote.is_online());

        remote.push(&LedgerSnapshot::seeded()).await.unwrap();

        let stored = std::fs::read_to_string(remote.mirror_directory().join(MIRROR_FILE)).unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&stored).unwrap();
        assert_eq!(snapshot, LedgerSnapshot::seeded());
    }

    #[test]
    fn test_mirror_offline_when_parent_missing() {
        let temp_dir = TempDir::new().unwrap();
        let remote = GitMirrorRemote::new(temp_dir.path().join("unmounted").join("mirror"));
        assert!(!remote.is_online());
    }
}

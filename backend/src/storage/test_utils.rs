//! Test environment backed by a temporary data directory.
//!
//! The directory is removed when the environment is dropped, even if the
//! test panics.
use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::json::{JsonConnection, SnapshotRepository};

pub struct TestEnvironment {
    pub connection: JsonConnection,
    pub repository: SnapshotRepository,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = JsonConnection::new(temp_dir.path())?;
        Ok(Self {
            repository: SnapshotRepository::new(connection.clone()),
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
        }
        assert!(!base_path.exists());
        Ok(())
    }
}

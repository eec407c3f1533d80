//! Data directory handle shared by the JSON repositories.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Open the data directory, creating it when missing.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        if !base_directory.exists() {
            fs::create_dir_all(&base_directory)
                .with_context(|| format!("Failed to create data directory {:?}", base_directory))?;
            info!("Created data directory: {:?}", base_directory);
        }
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Read a file, `None` when it does not exist.
    pub fn read_file(&self, file_name: &str) -> Result<Option<String>> {
        let path = self.file_path(file_name);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(content))
    }

    /// Write a file atomically: temp file first, then rename over the target.
    pub fn write_file_atomic(&self, file_name: &str, content: &str) -> Result<()> {
        let path = self.file_path(file_name);
        write_atomic(&path, content)?;
        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }
}

pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).with_context(|| format!("Failed to write {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

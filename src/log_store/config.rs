//! Logger configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{LogError, LogResult};

/// Default rollover threshold (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Configuration for a [`BinaryLogger`](super::BinaryLogger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Path of the active log file
    pub file_path: PathBuf,
    /// Size in bytes that triggers a rollover before the next write
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Whether missing parent directories are created on open
    #[serde(default = "default_true")]
    pub create_parent_dirs: bool,
    /// Whether each append is synced to disk after the flush
    #[serde(default)]
    pub sync_on_write: bool,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_true() -> bool {
    true
}

impl LoggerConfig {
    /// Create config for the given active file path
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            create_parent_dirs: true,
            sync_on_write: false,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Parse a config from a JSON document
    pub fn from_json_str(json: &str) -> LogResult<Self> {
        serde_json::from_str(json).map_err(|e| LogError::InvalidConfig(e.to_string()))
    }

    /// Get the active file path
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Check the config before any file is touched
    pub fn validate(&self) -> LogResult<()> {
        if self.max_file_size == 0 {
            return Err(LogError::InvalidConfig(
                "max file size must be positive".to_string(),
            ));
        }

        if self.file_path.file_name().is_none() {
            return Err(LogError::InvalidConfig(format!(
                "log path has no file name: {}",
                self.file_path.display()
            )));
        }

        if self.file_path.is_dir() {
            return Err(LogError::InvalidConfig(format!(
                "log path is a directory: {}",
                self.file_path.display()
            )));
        }

        Ok(())
    }
}

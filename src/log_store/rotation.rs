//! Backup naming and discovery
//!
//! A rollover renames the active file `<stem>.<ext>` to `<stem>.<N>.<ext>`,
//! where `N` is the 0-based rollover sequence. Paths without an extension
//! rotate to `<stem>.<N>`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::LogResult;

/// Backup naming and lookup for one active log path
#[derive(Debug, Clone)]
pub struct LogRotation {
    active_path: PathBuf,
}

impl LogRotation {
    /// Create a rotation helper for the given active file
    pub fn new<P: AsRef<Path>>(active_path: P) -> Self {
        Self {
            active_path: active_path.as_ref().to_path_buf(),
        }
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Path the active file is renamed to at rollover `seq`
    pub fn backup_path(&self, seq: u64) -> PathBuf {
        let stem = self.active_path.file_stem().unwrap_or_default();

        let mut name = OsString::from(stem);
        name.push(format!(".{}", seq));
        if let Some(ext) = self.active_path.extension() {
            name.push(".");
            name.push(ext);
        }

        self.active_path.with_file_name(name)
    }

    /// Extract the rollover sequence from a candidate backup path
    ///
    /// Returns `None` unless the name is exactly `<stem>.<digits>[.<ext>]`.
    pub fn parse_seq(&self, candidate: &Path) -> Option<u64> {
        let name = candidate.file_name()?.to_string_lossy();
        let stem = self.active_path.file_stem()?.to_string_lossy();

        let rest = name.strip_prefix(&format!("{}.", stem))?;
        let digits = match self.active_path.extension() {
            Some(ext) => rest.strip_suffix(&format!(".{}", ext.to_string_lossy()))?,
            None => rest,
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Directory that holds the active file and its backups
    fn log_dir(&self) -> PathBuf {
        match self.active_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// List existing backups, oldest first
    ///
    /// Sorted numerically, so `events.10.bin` follows `events.9.bin`.
    pub fn list_backups(&self) -> LogResult<Vec<BackupFile>> {
        let dir = self.log_dir();

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type()?.is_file() {
                continue;
            }

            if let Some(seq) = self.parse_seq(&path) {
                backups.push(BackupFile {
                    path: self.active_path.with_file_name(entry.file_name()),
                    seq,
                });
            }
        }

        backups.sort_by_key(|b| b.seq);

        Ok(backups)
    }

    /// Sequence number of the newest backup, if any
    pub fn last_rollover_seq(&self) -> LogResult<Option<u64>> {
        Ok(self.list_backups()?.last().map(|b| b.seq))
    }

    /// Sequence the next rollover will use
    pub fn next_rollover_seq(&self) -> LogResult<u64> {
        Ok(self.last_rollover_seq()?.map_or(0, |seq| seq + 1))
    }
}

/// A rotated-out log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub seq: u64,
}

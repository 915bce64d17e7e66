//! Log Store Statistics
//!
//! Provides statistics about a log and its backups:
//! - Record counts per file
//! - Storage size information
//! - Backup inventory with modification times

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::LogResult;
use super::record::RecordReader;
use super::rotation::LogRotation;

/// Statistics about a log file and its backups
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    /// Path of the active file
    pub active_path: PathBuf,
    /// Size of the active file in bytes
    pub active_size: u64,
    /// Number of records in the active file
    pub active_record_count: usize,
    /// Backups, oldest first
    pub backups: Vec<BackupInfo>,
}

impl LogStats {
    pub fn backup_count(&self) -> usize {
        self.backups.len()
    }

    pub fn backup_size(&self) -> u64 {
        self.backups.iter().map(|b| b.size).sum()
    }

    pub fn backup_record_count(&self) -> usize {
        self.backups.iter().map(|b| b.record_count).sum()
    }

    /// Calculate total records
    pub fn total_records(&self) -> usize {
        self.active_record_count + self.backup_record_count()
    }

    /// Calculate total storage size
    pub fn total_size(&self) -> u64 {
        self.active_size + self.backup_size()
    }

    /// Format size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} B", bytes)
        }
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} records in {} ({} backups, {} total)",
            self.total_records(),
            self.active_path.display(),
            self.backup_count(),
            Self::format_size(self.total_size())
        )
    }
}

/// Information about a backup file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub path: PathBuf,
    /// Rollover sequence number
    pub seq: u64,
    /// Size in bytes
    pub size: u64,
    pub record_count: usize,
    pub modified: Option<DateTime<Utc>>,
}

/// Collector for log statistics
pub struct StatsCollector {
    active_path: PathBuf,
}

impl StatsCollector {
    /// Create a new stats collector for the given active file
    pub fn new<P: AsRef<Path>>(active_path: P) -> Self {
        Self {
            active_path: active_path.as_ref().to_path_buf(),
        }
    }

    /// Collect all statistics
    ///
    /// Every file is decoded in full, so a malformed record surfaces as a
    /// `Decode` error.
    pub fn collect(&self) -> LogResult<LogStats> {
        let mut stats = LogStats {
            active_path: self.active_path.clone(),
            ..Default::default()
        };

        if self.active_path.exists() {
            stats.active_size = fs::metadata(&self.active_path)?.len();
            stats.active_record_count = Self::count_records(&self.active_path)?;
        }

        let rotation = LogRotation::new(&self.active_path);
        for backup in rotation.list_backups()? {
            let metadata = fs::metadata(&backup.path)?;
            stats.backups.push(BackupInfo {
                record_count: Self::count_records(&backup.path)?,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                seq: backup.seq,
                path: backup.path,
            });
        }

        Ok(stats)
    }

    /// Count records in a file
    fn count_records(path: &Path) -> LogResult<usize> {
        let mut count = 0;
        for record in RecordReader::open(path)? {
            record?;
            count += 1;
        }
        Ok(count)
    }
}

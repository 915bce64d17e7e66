//! Error types for the log store

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for log store operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur in log store operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Rejected at construction time; the logger was never opened
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Logger is closed and cannot write records")]
    Closed,

    /// Open/write/flush failure. The logger stays open and the size counter
    /// is unchanged, so the write may be retried.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Rename or reopen failed during rollover. The logger is degraded and
    /// only `close()` is meaningful afterwards.
    #[error("Rollover failed at {}: {source}", path.display())]
    Rollover {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Logger was degraded by an earlier rollover failure, or by a failed
    /// write whose partial bytes could not be truncated
    #[error("Logger is degraded after a failed rollover: {0}")]
    Degraded(String),

    #[error("Decode error at offset {offset}: {reason}")]
    Decode { offset: u64, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogError {
    pub(crate) fn decode(offset: u64, reason: impl Into<String>) -> Self {
        LogError::Decode {
            offset,
            reason: reason.into(),
        }
    }

    /// True for writes rejected because the logger was closed
    pub fn is_closed(&self) -> bool {
        matches!(self, LogError::Closed)
    }

    /// True for malformed-record errors raised while reading
    pub fn is_decode(&self) -> bool {
        matches!(self, LogError::Decode { .. })
    }

    /// True for rollover failures, including writes refused afterwards
    pub fn is_rollover(&self) -> bool {
        matches!(self, LogError::Rollover { .. } | LogError::Degraded(_))
    }
}

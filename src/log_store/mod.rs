//! Log Store Module
//!
//! This module provides the append-only binary log:
//! - `BinaryLogger`: Public façade that encodes, writes and replays records
//! - `LogState`: Owns the active file, its size and the rollover sequence
//! - `LogRotation`: Names and discovers rotated backup files
//! - `StatsCollector`: Collects sizes and record counts
//!
//! # Architecture
//!
//! ```text
//! Write Path (one lock held throughout):
//! ┌─────────┐    ┌───────────────┐    ┌──────────────────┐    ┌──────────────┐
//! │ write() │───►│ encode record │───►│ would it exceed  │───►│ append+flush │
//! │         │    │ [len][utf-8]  │    │ max_file_size?   │    │ size += len  │
//! └─────────┘    └───────────────┘    └────────┬─────────┘    └──────────────┘
//!                                              │ yes (and file not empty)
//!                                              ▼
//!                                     ┌──────────────────┐
//!                                     │ rename active to │
//!                                     │ stem.N.ext, open │
//!                                     │ fresh active     │
//!                                     └──────────────────┘
//!
//! Read Path (no lock):
//! ┌───────────────────────┐    ┌──────────────────┐
//! │ stem.0.ext, stem.1... │───►│ active stem.ext  │───► records in write order
//! └───────────────────────┘    └──────────────────┘
//! ```

mod config;
mod error;
mod logger;
mod record;
mod rotation;
mod state;
mod stats;

pub use config::{LoggerConfig, DEFAULT_MAX_FILE_SIZE};
pub use error::{LogError, LogResult};
pub use logger::{BinaryLogger, History, Records, ScopedLogger};
pub use record::{encode_record, encoded_len, RecordReader, LENGTH_PREFIX_SIZE};
pub use rotation::{BackupFile, LogRotation};
pub use state::{LogState, LogStatus};
pub use stats::{BackupInfo, LogStats, StatsCollector};

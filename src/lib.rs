//! Binlog Store
//!
//! An append-only binary log on local disk with size-triggered rollover and
//! thread-safe writers.
//!
//! # Features
//!
//! - **Length-prefixed records**: `[u32 big-endian length][UTF-8 payload]`
//! - **Rollover**: the active file is renamed to `stem.N.ext` before a write
//!   that would push it past `max_file_size`
//! - **Thread-Safe**: one mutex orders every write, rollover and close
//! - **Lazy replay**: read one file, or all backups followed by the active file
//!
//! # Modules
//!
//! - `log_store`: Logger façade, file state, record codec, rotation and stats
//!
//! # Example
//!
//! ```no_run
//! use binlog_store::BinaryLogger;
//!
//! fn main() -> binlog_store::LogResult<()> {
//!     let logger = BinaryLogger::new("logs/events.bin", 1000)?;
//!     logger.write("User login: user123")?;
//!
//!     for record in logger.read(None)? {
//!         println!("{}", record?);
//!     }
//!
//!     logger.close()
//! }
//! ```

pub mod log_store;

// Re-export commonly used items at crate root
pub use log_store::{
    BackupFile, BinaryLogger, LogError, LogResult, LogRotation, LogStats, LogStatus,
    LoggerConfig, ScopedLogger, StatsCollector,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

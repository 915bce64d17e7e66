//! Binary Logger - public façade over the log state
//!
//! `BinaryLogger` encodes text payloads into length-prefixed records, hands
//! them to [`LogState`] for appending, and replays records from the active
//! file or its backups.

use std::fs::File;
use std::io::BufReader;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use super::config::LoggerConfig;
use super::error::{LogError, LogResult};
use super::record::{encode_record, RecordReader};
use super::rotation::{BackupFile, LogRotation};
use super::state::{LogState, LogStatus};

/// Records read from a single log file
pub type Records = RecordReader<BufReader<File>>;

/// Thread-safe append-only binary logger with size-triggered rollover
///
/// Share across threads with `Arc<BinaryLogger>`; every write is fully
/// ordered with respect to other writes, rollovers and `close()`.
pub struct BinaryLogger {
    state: LogState,
}

impl BinaryLogger {
    /// Open a logger on `file_path` that rolls over past `max_file_size` bytes
    pub fn new<P: AsRef<Path>>(file_path: P, max_file_size: u64) -> LogResult<Self> {
        Self::with_config(LoggerConfig::new(file_path).with_max_file_size(max_file_size))
    }

    /// Open a logger with a custom config
    pub fn with_config(config: LoggerConfig) -> LogResult<Self> {
        Ok(Self {
            state: LogState::open(config)?,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &LoggerConfig {
        self.state.config()
    }

    /// Path of the active file
    pub fn file_path(&self) -> &Path {
        self.state.file_path()
    }

    pub fn max_file_size(&self) -> u64 {
        self.state.config().max_file_size
    }

    /// Bytes in the active file
    pub fn current_size(&self) -> u64 {
        self.state.current_size()
    }

    pub fn status(&self) -> LogStatus {
        self.state.status()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Append one text payload as a record
    pub fn write(&self, payload: &str) -> LogResult<()> {
        let record = encode_record(payload)?;
        self.state.append(&record)
    }

    /// Force a rollover, returning the new backup path
    pub fn rollover(&self) -> LogResult<PathBuf> {
        self.state.rollover()
    }

    /// Read records from `file_path`, or from the active file when `None`
    ///
    /// Each call opens the file afresh. The active file is not locked while
    /// reading, so a concurrent write may show up as a trailing decode error.
    pub fn read(&self, file_path: Option<&Path>) -> LogResult<Records> {
        RecordReader::open(file_path.unwrap_or_else(|| self.file_path()))
    }

    /// Read every backup of `file_path` (oldest first) and then the file itself
    pub fn read_history(&self, file_path: Option<&Path>) -> LogResult<History> {
        History::new(file_path.unwrap_or_else(|| self.file_path()))
    }

    /// Existing backups of the active file, oldest first
    pub fn backups(&self) -> LogResult<Vec<BackupFile>> {
        self.state.rotation().list_backups()
    }

    /// Close the logger. Later writes fail with `LogError::Closed`.
    pub fn close(&self) -> LogResult<()> {
        self.state.close()
    }

    /// Borrow the logger for a scope that always ends with `close()`
    ///
    /// ```no_run
    /// use binlog_store::BinaryLogger;
    ///
    /// let logger = BinaryLogger::new("logs/events.bin", 1000)?;
    /// {
    ///     let scope = logger.scope();
    ///     scope.write("hello")?;
    /// }
    /// assert!(logger.is_closed());
    /// # Ok::<(), binlog_store::LogError>(())
    /// ```
    pub fn scope(&self) -> ScopedLogger<'_> {
        ScopedLogger {
            logger: self,
            finished: false,
        }
    }

    /// Run `body` against the logger, then close it however `body` exits
    ///
    /// When `body` succeeds, a failure to close is returned. When `body`
    /// fails or panics, the logger is still closed and the body's error wins.
    pub fn scoped<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&BinaryLogger) -> Result<T, E>,
        E: From<LogError>,
    {
        let scope = self.scope();
        let value = body(&scope)?;
        scope.finish()?;
        Ok(value)
    }
}

/// Guard returned by [`BinaryLogger::scope`]
///
/// Closes the logger exactly once: through [`finish`](Self::finish), or on
/// drop if `finish` was never called.
pub struct ScopedLogger<'a> {
    logger: &'a BinaryLogger,
    finished: bool,
}

impl ScopedLogger<'_> {
    /// Close the logger now, reporting any flush or sync failure
    pub fn finish(mut self) -> LogResult<()> {
        self.finished = true;
        self.logger.close()
    }
}

impl Deref for ScopedLogger<'_> {
    type Target = BinaryLogger;

    fn deref(&self) -> &BinaryLogger {
        self.logger
    }
}

impl Drop for ScopedLogger<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.logger.close();
        }
    }
}

/// Records from a log's backups followed by its active file
///
/// Files are opened lazily, one at a time. The first error ends the
/// iteration.
pub struct History {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<Records>,
    done: bool,
}

impl History {
    fn new(active_path: &Path) -> LogResult<Self> {
        let mut paths: Vec<PathBuf> = LogRotation::new(active_path)
            .list_backups()?
            .into_iter()
            .map(|b| b.path)
            .collect();
        paths.push(active_path.to_path_buf());

        Ok(Self {
            paths: paths.into_iter(),
            current: None,
            done: false,
        })
    }

    fn fail(&mut self, err: LogError) -> Option<LogResult<String>> {
        self.done = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for History {
    type Item = LogResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some(records) = self.current.as_mut() {
                match records.next() {
                    Some(Ok(text)) => return Some(Ok(text)),
                    Some(Err(e)) => return self.fail(e),
                    None => self.current = None,
                }
            }

            match self.paths.next() {
                Some(path) => match RecordReader::open(&path) {
                    Ok(records) => self.current = Some(records),
                    Err(e) => return self.fail(e),
                },
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

//! Log State - active file ownership and rollover
//!
//! `LogState` owns the active file handle, the size counter and the rollover
//! sequence, all behind one mutex. Every public method takes the lock exactly
//! once and then works on the already-locked `StateInner`, so an append that
//! triggers a rollover never re-enters the lock.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::config::LoggerConfig;
use super::error::{LogError, LogResult};
use super::rotation::LogRotation;

/// Lifecycle status of a log state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    /// Accepting writes
    Open,
    /// A rollover failed; writes are refused until closed
    Degraded,
    /// Terminal
    Closed,
}

enum Handle {
    Open(File),
    Degraded(String),
    Closed,
}

struct StateInner {
    handle: Handle,
    current_size: u64,
    next_seq: u64,
}

/// Owner of the active log file
pub struct LogState {
    config: LoggerConfig,
    rotation: LogRotation,
    inner: Mutex<StateInner>,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl LogState {
    /// Open or create the active file described by `config`
    ///
    /// The size counter starts at the file's current length and the rollover
    /// sequence resumes after the newest existing backup.
    pub fn open(config: LoggerConfig) -> LogResult<Self> {
        config.validate()?;

        let path = config.file_path().to_path_buf();

        if config.create_parent_dirs {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let rotation = LogRotation::new(&path);
        let next_seq = rotation.next_rollover_seq()?;

        let file = open_append(&path)?;
        let current_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = current_size,
            next_seq,
            max_file_size = config.max_file_size,
            "opened log file"
        );

        Ok(Self {
            config,
            rotation,
            inner: Mutex::new(StateInner {
                handle: Handle::Open(file),
                current_size,
                next_seq,
            }),
        })
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn file_path(&self) -> &Path {
        self.config.file_path()
    }

    pub fn rotation(&self) -> &LogRotation {
        &self.rotation
    }

    /// Bytes written to the active file so far
    pub fn current_size(&self) -> u64 {
        self.inner.lock().current_size
    }

    /// Sequence number the next rollover will use
    pub fn next_seq(&self) -> u64 {
        self.inner.lock().next_seq
    }

    pub fn status(&self) -> LogStatus {
        match self.inner.lock().handle {
            Handle::Open(_) => LogStatus::Open,
            Handle::Degraded(_) => LogStatus::Degraded,
            Handle::Closed => LogStatus::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status() == LogStatus::Closed
    }

    /// Append encoded bytes, rolling over first if they would not fit
    ///
    /// A record larger than `max_file_size` is still written, alone, to an
    /// empty active file.
    pub fn append(&self, bytes: &[u8]) -> LogResult<()> {
        let mut inner = self.inner.lock();
        self.append_locked(&mut inner, bytes)
    }

    /// Rotate the active file out to the next backup path
    pub fn rollover(&self) -> LogResult<PathBuf> {
        let mut inner = self.inner.lock();
        self.rollover_locked(&mut inner)
    }

    /// Flush and close the active file. Closing twice is a no-op.
    pub fn close(&self) -> LogResult<()> {
        let mut inner = self.inner.lock();
        self.close_locked(&mut inner)
    }

    fn append_locked(&self, inner: &mut StateInner, bytes: &[u8]) -> LogResult<()> {
        writable(&mut inner.handle)?;

        let len = bytes.len() as u64;
        if inner.current_size > 0 && inner.current_size + len > self.config.max_file_size {
            self.rollover_locked(inner)?;
        }

        let file = writable(&mut inner.handle)?;
        if let Err(e) = write_record(file, bytes, self.config.sync_on_write) {
            // A partial record that cannot be cut off would corrupt every
            // later record, so stop accepting writes
            if let Err(reason) = discard_partial(file, inner.current_size) {
                inner.handle = Handle::Degraded(reason);
            }
            return Err(LogError::Io(e));
        }

        inner.current_size += len;
        trace!(bytes = len, size = inner.current_size, "appended record");

        Ok(())
    }

    fn rollover_locked(&self, inner: &mut StateInner) -> LogResult<PathBuf> {
        writable(&mut inner.handle)?;

        let path = self.file_path().to_path_buf();
        let backup = self.rotation.backup_path(inner.next_seq);

        if let Handle::Open(file) = mem::replace(&mut inner.handle, Handle::Closed) {
            drop(file);
        }

        if let Err(source) = fs::rename(&path, &backup) {
            inner.handle = Handle::Degraded(format!(
                "rename to {} failed: {}",
                backup.display(),
                source
            ));
            return Err(LogError::Rollover {
                path: backup,
                source,
            });
        }
        inner.next_seq += 1;

        match open_append(&path) {
            Ok(file) => inner.handle = Handle::Open(file),
            Err(source) => {
                inner.handle = Handle::Degraded(format!(
                    "reopen of {} failed: {}",
                    path.display(),
                    source
                ));
                return Err(LogError::Rollover { path, source });
            }
        }

        let rotated_size = mem::replace(&mut inner.current_size, 0);

        info!(
            backup = %backup.display(),
            seq = inner.next_seq - 1,
            size = rotated_size,
            "rolled over log file"
        );

        Ok(backup)
    }

    fn close_locked(&self, inner: &mut StateInner) -> LogResult<()> {
        match mem::replace(&mut inner.handle, Handle::Closed) {
            Handle::Open(mut file) => {
                file.flush()?;
                if self.config.sync_on_write {
                    file.sync_all()?;
                }
                debug!(
                    path = %self.file_path().display(),
                    size = inner.current_size,
                    "closed log file"
                );
                Ok(())
            }
            Handle::Degraded(_) | Handle::Closed => Ok(()),
        }
    }
}

impl Drop for LogState {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn write_record(file: &mut File, bytes: &[u8], sync: bool) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

/// Truncate the file back to `size` after a failed write
///
/// Succeeds when the truncation works or when nothing past `size` landed.
fn discard_partial(file: &File, size: u64) -> Result<(), String> {
    let err = match file.set_len(size) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    match file.metadata() {
        Ok(meta) if meta.len() == size => Ok(()),
        Ok(meta) => Err(format!(
            "{} stray bytes after failed write could not be truncated: {}",
            meta.len().saturating_sub(size),
            err
        )),
        Err(meta_err) => Err(format!(
            "truncate after failed write failed: {}; size unknown: {}",
            err, meta_err
        )),
    }
}

/// Borrow the live file, or explain why there is none
fn writable(handle: &mut Handle) -> LogResult<&mut File> {
    match handle {
        Handle::Open(file) => Ok(file),
        Handle::Degraded(reason) => Err(LogError::Degraded(reason.clone())),
        Handle::Closed => Err(LogError::Closed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_state(dir: &TempDir, max_file_size: u64) -> LogState {
        let config =
            LoggerConfig::new(dir.path().join("events.bin")).with_max_file_size(max_file_size);
        LogState::open(config).unwrap()
    }

    #[test]
    fn test_append_tracks_size() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 100);

        state.append(&[1, 2, 3]).unwrap();
        state.append(&[4, 5]).unwrap();

        assert_eq!(state.current_size(), 5);
        assert_eq!(fs::read(state.file_path()).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_append_rolls_over_when_full() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 10);

        state.append(&[0; 6]).unwrap();
        state.append(&[1; 8]).unwrap();

        assert_eq!(state.current_size(), 8);
        assert_eq!(state.next_seq(), 1);
        assert_eq!(fs::read(temp_dir.path().join("events.0.bin")).unwrap(), vec![0; 6]);
        assert_eq!(fs::read(state.file_path()).unwrap(), vec![1; 8]);
    }

    #[test]
    fn test_exact_fit_does_not_roll_over() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 10);

        state.append(&[0; 4]).unwrap();
        state.append(&[0; 6]).unwrap();

        assert_eq!(state.current_size(), 10);
        assert_eq!(state.next_seq(), 0);
    }

    #[test]
    fn test_oversized_record_written_alone() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 10);

        // Empty file: written without a rollover
        state.append(&[7; 25]).unwrap();
        assert_eq!(state.current_size(), 25);
        assert_eq!(state.next_seq(), 0);

        // Non-empty file: rolled over first, then written alone again
        state.append(&[8; 30]).unwrap();
        assert_eq!(state.current_size(), 30);
        assert_eq!(state.next_seq(), 1);
        assert_eq!(fs::read(temp_dir.path().join("events.0.bin")).unwrap().len(), 25);
    }

    #[test]
    fn test_explicit_rollover() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 100);

        state.append(b"abc").unwrap();
        let backup = state.rollover().unwrap();

        assert_eq!(backup, temp_dir.path().join("events.0.bin"));
        assert_eq!(fs::read(&backup).unwrap(), b"abc");
        assert_eq!(state.current_size(), 0);
        assert_eq!(fs::metadata(state.file_path()).unwrap().len(), 0);
    }

    #[test]
    fn test_reopen_resumes_size_and_sequence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let state = open_state(&temp_dir, 10);
            state.append(&[0; 8]).unwrap();
            state.append(&[0; 8]).unwrap();
            state.append(&[0; 3]).unwrap();
            state.close().unwrap();
        }

        let state = open_state(&temp_dir, 10);
        assert_eq!(state.current_size(), 3);
        assert_eq!(state.next_seq(), 2);

        state.append(&[0; 8]).unwrap();
        assert!(temp_dir.path().join("events.2.bin").exists());
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 10);

        state.close().unwrap();
        state.close().unwrap();

        assert_eq!(state.status(), LogStatus::Closed);
        assert!(state.append(b"x").unwrap_err().is_closed());
        assert!(state.rollover().unwrap_err().is_closed());
    }

    #[test]
    fn test_discard_partial_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.bin");
        fs::write(&path, [1u8; 10]).unwrap();

        let file = OpenOptions::new().write(true).open(&path).unwrap();
        discard_partial(&file, 4).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 4);
    }

    #[test]
    fn test_discard_partial_reports_stray_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.bin");
        fs::write(&path, [1u8; 10]).unwrap();

        // Read-only handle: set_len fails
        let file = File::open(&path).unwrap();
        let reason = discard_partial(&file, 4).unwrap_err();
        assert!(reason.contains("6 stray bytes"));

        // Nothing past the counter: nothing to discard
        assert!(discard_partial(&file, 10).is_ok());
        assert_eq!(fs::metadata(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_failed_rollover_degrades() {
        let temp_dir = TempDir::new().unwrap();
        let state = open_state(&temp_dir, 10);

        // A non-empty directory squatting on the backup name blocks the rename
        let blocker = temp_dir.path().join("events.0.bin");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        state.append(&[0; 8]).unwrap();
        let err = state.append(&[0; 8]).unwrap_err();
        assert!(matches!(err, LogError::Rollover { .. }));
        assert_eq!(state.status(), LogStatus::Degraded);

        let err = state.append(&[0; 1]).unwrap_err();
        assert!(matches!(err, LogError::Degraded(_)));
        assert!(err.is_rollover());

        state.close().unwrap();
        assert_eq!(state.status(), LogStatus::Closed);

        // The active file still holds the record written before the failure
        assert_eq!(fs::read(temp_dir.path().join("events.bin")).unwrap().len(), 8);
    }
}

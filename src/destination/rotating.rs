//! File destination with size- or time-triggered rotation

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

use super::policy::{Clock, RotateWhen, RotationPolicy, SystemClock};
use super::retention;
use super::Destination;
use crate::error::{ConfigurationError, DestinationWriteError};

/// The file currently being written and what has gone into it
struct Segment {
    file: File,
    /// Bytes in the current file since it was opened or last rotated
    size_bytes: u64,
    opened_at: DateTime<Local>,
    rotations: u64,
}

/// Appends lines to a file, rotating it per its policy before a write
///
/// The rotation check, the rotation itself and the write happen under one
/// lock, so concurrent writers never both rotate or split a size check from
/// its write. A destination without a policy never rotates.
pub struct RotatingFileDestination {
    path: PathBuf,
    policy: Option<RotationPolicy>,
    backup_count: usize,
    clock: Arc<dyn Clock>,
    segment: Mutex<Segment>,
}

impl RotatingFileDestination {
    /// Open (or create) `path` for appending, creating its directory if needed
    pub fn open(
        path: impl Into<PathBuf>,
        policy: Option<RotationPolicy>,
        backup_count: usize,
    ) -> Result<Self, ConfigurationError> {
        Self::open_with_clock(path, policy, backup_count, Arc::new(SystemClock))
    }

    /// Like [`open`](Self::open), reading the time from `clock`
    pub fn open_with_clock(
        path: impl Into<PathBuf>,
        policy: Option<RotationPolicy>,
        backup_count: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        let path = path.into();
        if let Some(RotationPolicy::SizeTriggered { max_bytes: 0 }) = policy {
            return Err(ConfigurationError::InvalidMaxBytes);
        }

        ensure_parent_dir(&path)?;

        let existed = path.exists();
        let file = open_append(&path).map_err(|source| open_error(&path, source))?;
        let metadata = file
            .metadata()
            .map_err(|source| open_error(&path, source))?;

        let now = clock.now();
        // an existing file keeps counting toward its limits
        let opened_at = match policy {
            Some(RotationPolicy::TimeTriggered { .. }) if existed => metadata
                .modified()
                .map(DateTime::<Local>::from)
                .unwrap_or(now),
            _ => now,
        };

        Ok(Self {
            path,
            policy,
            backup_count,
            clock,
            segment: Mutex::new(Segment {
                file,
                size_bytes: metadata.len(),
                opened_at,
                rotations: 0,
            }),
        })
    }

    /// Path of the current log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> Option<RotationPolicy> {
        self.policy
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    /// Bytes written to the current file since it was opened or rotated
    pub fn size_bytes(&self) -> u64 {
        self.with_segment(|s| s.size_bytes)
    }

    pub fn opened_at(&self) -> DateTime<Local> {
        self.with_segment(|s| s.opened_at)
    }

    /// Number of successful rotations since this destination was opened
    pub fn rotation_count(&self) -> u64 {
        self.with_segment(|s| s.rotations)
    }

    /// The next rollover boundary, for time-triggered destinations
    pub fn next_rollover(&self) -> Option<DateTime<Local>> {
        match self.policy {
            Some(RotationPolicy::TimeTriggered { interval }) => {
                Some(interval.next_rollover(self.opened_at()))
            }
            _ => None,
        }
    }

    fn with_segment<T>(&self, f: impl FnOnce(&Segment) -> T) -> T {
        match self.segment.lock() {
            Ok(segment) => f(&*segment),
            Err(poisoned) => f(&*poisoned.into_inner()),
        }
    }

    /// Close the current file into the backup set and start a fresh one
    ///
    /// On error the current file stays open and keeps receiving writes.
    fn rotate(&self, segment: &mut Segment, now: DateTime<Local>) -> Result<(), DestinationWriteError> {
        let Some(policy) = self.policy else {
            return Ok(());
        };
        let rotate_error = |source: io::Error| DestinationWriteError::Rotate {
            path: self.path.clone(),
            source,
        };

        segment.file.flush().map_err(rotate_error)?;

        match policy {
            RotationPolicy::SizeTriggered { .. } if self.backup_count == 0 => {
                // nothing to keep, start over in place
                segment.file.set_len(0).map_err(rotate_error)?;
            }
            RotationPolicy::SizeTriggered { .. } => {
                retention::shift_size_backups(&self.path, self.backup_count)
                    .map_err(rotate_error)?;
                let backup = retention::size_backup_path(&self.path, 1);
                segment.file = reopen_or_restore(&self.path, &backup, open_append)
                    .map_err(rotate_error)?;
                self.prune(|| retention::prune_size_backups(&self.path, self.backup_count));
            }
            RotationPolicy::TimeTriggered { interval } => {
                let backup = self
                    .rename_time_backup(segment.opened_at, interval)
                    .map_err(rotate_error)?;
                segment.file = reopen_or_restore(&self.path, &backup, open_append)
                    .map_err(rotate_error)?;
                if self.backup_count > 0 {
                    self.prune(|| {
                        retention::prune_time_backups(&self.path, interval, self.backup_count)
                    });
                }
            }
        }

        segment.size_bytes = 0;
        segment.opened_at = now;
        segment.rotations += 1;
        tracing::debug!(path = %self.path.display(), rotations = segment.rotations, "rotated log file");
        Ok(())
    }

    fn rename_time_backup(&self, period_start: DateTime<Local>, interval: RotateWhen) -> io::Result<PathBuf> {
        let backup = retention::time_backup_path(&self.path, period_start, interval);
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::rename(&self.path, &backup)?;
        Ok(backup)
    }

    /// Pruning happens after the new file is open; a failure only leaves extra backups
    fn prune(&self, prune: impl FnOnce() -> io::Result<usize>) {
        match prune() {
            Ok(0) => {}
            Ok(count) => tracing::debug!(path = %self.path.display(), count, "pruned old backups"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to prune old backups"),
        }
    }
}

impl Destination for RotatingFileDestination {
    fn write_line(&self, line: &str) -> Result<(), DestinationWriteError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        let incoming = buf.len() as u64;

        let mut segment = self
            .segment
            .lock()
            .map_err(|_| DestinationWriteError::Poisoned)?;

        let mut rotation_error = None;
        if let Some(policy) = self.policy {
            let now = self.clock.now();
            if policy.is_due(segment.size_bytes, segment.opened_at, incoming, now) {
                if let Err(e) = self.rotate(&mut *segment, now) {
                    tracing::warn!(path = %self.path.display(), error = %e, "rotation failed, writing to current file");
                    rotation_error = Some(e);
                }
            }
        }

        segment
            .file
            .write_all(buf.as_bytes())
            .map_err(|source| DestinationWriteError::Write {
                path: self.path.clone(),
                source,
            })?;
        segment.size_bytes += incoming;

        // the line is on disk; still surface the failed rotation to the caller
        match rotation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<(), DestinationWriteError> {
        let mut segment = self
            .segment
            .lock()
            .map_err(|_| DestinationWriteError::Poisoned)?;
        segment
            .file
            .flush()
            .map_err(|source| DestinationWriteError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Open a fresh `path` after it was renamed to `backup`
///
/// If the open fails the rename is undone, so the still-open handle keeps
/// writing to the file named `path` rather than to the backup.
fn reopen_or_restore(
    path: &Path,
    backup: &Path,
    open: impl FnOnce(&Path) -> io::Result<File>,
) -> io::Result<File> {
    open(path).map_err(|e| {
        if let Err(undo) = fs::rename(backup, path) {
            tracing::error!(
                path = %path.display(),
                backup = %backup.display(),
                error = %undo,
                "could not restore log file after failed reopen"
            );
        }
        e
    })
}

fn ensure_parent_dir(path: &Path) -> Result<(), ConfigurationError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ConfigurationError::UnwritableDirectory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn open_error(path: &Path, source: io::Error) -> ConfigurationError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        ConfigurationError::UnwritableDirectory {
            path: dir.to_path_buf(),
            source,
        }
    } else {
        ConfigurationError::OpenFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}

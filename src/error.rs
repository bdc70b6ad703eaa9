//! Error types for logger construction and destination writes
//!
//! Construction problems surface as [`ConfigurationError`] and are fatal to
//! construction only. Everything that can go wrong while a line is being
//! written surfaces as [`DestinationWriteError`], which the logger reports and
//! swallows so that logging never takes the host application down.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid construction options
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Size-triggered rotation needs a positive byte bound
    #[error("max_bytes must be greater than zero")]
    InvalidMaxBytes,

    #[error("unrecognized rotation interval '{0}' (expected S, M, H, D or MIDNIGHT)")]
    UnrecognizedRotateWhen(String),

    #[error("unrecognized log level '{0}'")]
    UnrecognizedLevel(String),

    #[error("invalid time format '{0}'")]
    InvalidTimeFormat(String),

    #[error("log directory {} is not writable: {source}", path.display())]
    UnwritableDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed TOML or a field of the wrong type
    #[error("failed to parse logger config: {0}")]
    Parse(String),
}

/// A failure while writing to, or rotating, a destination
#[derive(Debug, Error)]
pub enum DestinationWriteError {
    #[error("failed to write to {}: {}", path.display(), DiskErrorKind::from(source).describe(source))]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rotate {}: {}", path.display(), DiskErrorKind::from(source).describe(source))]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A previous writer panicked while holding the destination lock
    #[error("destination lock poisoned")]
    Poisoned,
}

impl DestinationWriteError {
    /// Classify the underlying IO failure, if any
    pub fn kind(&self) -> Option<DiskErrorKind> {
        match self {
            DestinationWriteError::Write { source, .. }
            | DestinationWriteError::Rotate { source, .. } => Some(DiskErrorKind::from(source)),
            DestinationWriteError::Poisoned => None,
        }
    }
}

/// Categories of disk errors for readable reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    /// Short description of this error kind
    pub fn user_message(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "disk full",
            DiskErrorKind::PermissionDenied => "permission denied",
            DiskErrorKind::NotFound => "file or directory not found",
            DiskErrorKind::Other => "I/O error",
        }
    }

    fn describe(&self, e: &io::Error) -> String {
        match self {
            DiskErrorKind::Other => e.to_string(),
            kind => kind.user_message().to_string(),
        }
    }
}

impl From<&io::Error> for DiskErrorKind {
    fn from(e: &io::Error) -> Self {
        use std::io::ErrorKind;

        match e.kind() {
            // On some systems, disk full appears as WriteZero
            ErrorKind::WriteZero => DiskErrorKind::DiskFull,
            ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,
            ErrorKind::NotFound => DiskErrorKind::NotFound,
            _ => {
                #[cfg(unix)]
                {
                    if let Some(os_error) = e.raw_os_error() {
                        // ENOSPC = 28, EDQUOT = 122 on Linux / 69 on macOS
                        if os_error == 28 || os_error == 122 || os_error == 69 {
                            return DiskErrorKind::DiskFull;
                        }
                        // EACCES
                        if os_error == 13 {
                            return DiskErrorKind::PermissionDenied;
                        }
                    }
                }
                DiskErrorKind::Other
            }
        }
    }
}

//! Log levels and the per-call log record

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Severity of a log record, totally ordered from `Debug` to `Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warning,
            3 => Level::Error,
            _ => Level::Critical,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "FATAL" => Ok(Level::Critical),
            _ => Err(ConfigurationError::UnrecognizedLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = ConfigurationError;

    // `Self::Error` would be ambiguous with the `Level::Error` variant
    fn try_from(value: String) -> Result<Self, ConfigurationError> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

/// Where a log call was made from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    /// Path of the source file as the compiler saw it
    pub file: String,
    pub line: u32,
    /// Module path, e.g. `my_app::server`
    pub module: String,
    /// Enclosing function name, empty when unknown
    pub function: String,
}

impl SourceInfo {
    /// Build from explicit call-site components (used by the logging macros)
    pub fn new(
        file: impl Into<String>,
        line: u32,
        module: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            module: module.into(),
            function: function.into(),
        }
    }

    /// Build from a `#[track_caller]` location; module and function stay empty
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            module: String::new(),
            function: String::new(),
        }
    }

    /// Last path component of `file`
    pub fn filename(&self) -> &str {
        self.file
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.file)
    }

    /// Module name, falling back to the file stem when no module path is known
    pub fn module_name(&self) -> &str {
        if self.module.is_empty() {
            let filename = self.filename();
            filename
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(filename)
        } else {
            &self.module
        }
    }
}

/// A single log call, immutable once built
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Local time the call was made
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub logger_name: String,
    pub message: String,
    pub source: SourceInfo,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(
        level: Level,
        logger_name: impl Into<String>,
        message: impl Into<String>,
        source: SourceInfo,
    ) -> Self {
        Self::at(Local::now(), level, logger_name, message, source)
    }

    /// Create a record with an explicit timestamp
    pub fn at(
        timestamp: DateTime<Local>,
        level: Level,
        logger_name: impl Into<String>,
        message: impl Into<String>,
        source: SourceInfo,
    ) -> Self {
        Self {
            timestamp,
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            source,
        }
    }
}

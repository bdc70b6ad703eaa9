//! Logwheel - leveled console and file logging with log rotation
//!
//! A [`Logger`] filters calls by level, formats each accepted call once and
//! hands the line to its destinations: the console and a
//! [`RotatingFileDestination`] that rotates by size or by time and keeps a
//! bounded set of backups.

pub mod config;
pub mod destination;
pub mod diagnostics;
pub mod error;
pub mod failure;
pub mod formatter;
pub mod logger;
pub mod record;
pub mod registry;

pub use config::LoggerConfig;
pub use destination::{
    ConsoleDestination, Destination, MemoryDestination, RotateWhen, RotatingFileDestination,
    RotationPolicy,
};
pub use error::{ConfigurationError, DestinationWriteError};
pub use formatter::Formatter;
pub use logger::Logger;
pub use record::{Level, LogRecord, SourceInfo};
pub use registry::{get_logger, Registry};

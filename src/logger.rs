//! The named logger: level filter, single formatting pass, fan-out
//!
//! A call below the logger's level returns before anything is formatted.
//! An accepted call is formatted once and the same line goes to every
//! destination in order. A destination that fails is reported and skipped;
//! nothing is ever returned to, or panics in, the caller.

use std::error::Error;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::config::LoggerConfig;
use crate::destination::{ConsoleDestination, Destination, RotatingFileDestination};
use crate::error::{ConfigurationError, DestinationWriteError};
use crate::failure;
use crate::formatter::Formatter;
use crate::record::{Level, LogRecord, SourceInfo};

/// A named logger owning its destinations
pub struct Logger {
    name: String,
    min_level: AtomicU8,
    formatter: Formatter,
    destinations: RwLock<Vec<Arc<dyn Destination>>>,
    file_path: Option<PathBuf>,
}

impl Logger {
    /// Build a logger and its destinations from `config`
    ///
    /// The file destination comes first, then the console if enabled.
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let file_path = config.resolved_file_path();
        let policy = config.rotation_policy()?;
        let file = RotatingFileDestination::open(&file_path, policy, config.backup_count)?;

        let mut destinations: Vec<Arc<dyn Destination>> = vec![Arc::new(file)];
        if config.console_enabled {
            destinations.push(Arc::new(ConsoleDestination::stdout()));
        }

        let mut logger = Self::with_destinations(
            config.name,
            config.min_level,
            Formatter::new(&config.template, config.time_format),
            destinations,
        );
        logger.file_path = Some(file_path);
        Ok(logger)
    }

    /// Assemble a logger from already-built parts
    pub fn with_destinations(
        name: impl Into<String>,
        min_level: Level,
        formatter: Formatter,
        destinations: Vec<Arc<dyn Destination>>,
    ) -> Self {
        Self {
            name: name.into(),
            min_level: AtomicU8::new(min_level.to_u8()),
            formatter,
            destinations: RwLock::new(destinations),
            file_path: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the file destination created from config, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.min_level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Attach another destination after the existing ones
    pub fn add_destination(&self, destination: Arc<dyn Destination>) {
        match self.destinations.write() {
            Ok(mut destinations) => destinations.push(destination),
            Err(poisoned) => poisoned.into_inner().push(destination),
        }
    }

    pub fn destination_count(&self) -> usize {
        self.read_destinations().len()
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.log_with_source(level, message, SourceInfo::from_location(Location::caller()));
    }

    /// Log with an explicit call site (used by the logging macros)
    pub fn log_with_source(&self, level: Level, message: &str, source: SourceInfo) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = LogRecord::new(level, self.name.as_str(), message, source);
        self.dispatch(&record);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    /// Log at ERROR with the active failure context of this thread appended
    ///
    /// Without an active context (see [`failure::capture`]) only `message`
    /// is logged.
    #[track_caller]
    pub fn exception(&self, message: &str) {
        self.exception_with_source(message, SourceInfo::from_location(Location::caller()));
    }

    /// Capture `err` as the active failure and log it at ERROR
    #[track_caller]
    pub fn exception_with<E: Error + 'static>(&self, message: &str, err: &E) {
        // capturing takes a backtrace, skip it when ERROR is filtered out
        if !self.is_enabled_for(Level::Error) {
            return;
        }
        let _guard = failure::capture(err);
        self.exception(message);
    }

    pub fn exception_with_source(&self, message: &str, source: SourceInfo) {
        if !self.is_enabled_for(Level::Error) {
            return;
        }
        match failure::render_current() {
            Some(stack) => {
                self.log_with_source(Level::Error, &format!("{}\n{}", message, stack), source)
            }
            None => self.log_with_source(Level::Error, message, source),
        }
    }

    /// Flush every destination, reporting failures
    pub fn flush(&self) {
        for destination in self.read_destinations().iter() {
            if let Err(e) = destination.flush() {
                self.report(&e);
            }
        }
    }

    /// Flush and release every destination; later calls are silently dropped
    pub fn close(&self) {
        self.flush();
        match self.destinations.write() {
            Ok(mut destinations) => destinations.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn dispatch(&self, record: &LogRecord) {
        let line = self.formatter.format(record);
        for destination in self.read_destinations().iter() {
            if let Err(e) = destination.write_line(&line) {
                self.report(&e);
            }
        }
    }

    fn read_destinations(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn Destination>>> {
        match self.destinations.read() {
            Ok(destinations) => destinations,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Destination failures go to tracing and, as a last resort, stderr
    fn report(&self, error: &DestinationWriteError) {
        tracing::error!(logger = %self.name, error = %error, "log destination failed");
        eprintln!("--- logging error in {}: {} ---", self.name, error);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.flush();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("destinations", &self.destination_count())
            .field("file_path", &self.file_path)
            .finish()
    }
}

/// Name of the enclosing function, resolved at compile time
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::")
            .find(|part| *part != "{{closure}}")
            .unwrap_or(name)
    }};
}

/// Call-site information for the logging macros
#[doc(hidden)]
#[macro_export]
macro_rules! __source_info {
    () => {
        $crate::SourceInfo::new(file!(), line!(), module_path!(), $crate::__function_name!())
    };
}

/// Log a `format!`-style message at `level`, capturing the full call site
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let __logger = &$logger;
        if __logger.is_enabled_for($level) {
            __logger.log_with_source($level, &format!($($arg)+), $crate::__source_info!());
        }
    }};
}

#[macro_export]
macro_rules! log_debug { ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Debug, $($arg)+) } }
#[macro_export]
macro_rules! log_info { ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Info, $($arg)+) } }
#[macro_export]
macro_rules! log_warning { ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Warning, $($arg)+) } }
#[macro_export]
macro_rules! log_error { ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Error, $($arg)+) } }
#[macro_export]
macro_rules! log_critical { ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Critical, $($arg)+) } }

/// Like `log_error!`, with the thread's active failure context appended
#[macro_export]
macro_rules! log_exception {
    ($logger:expr, $($arg:tt)+) => {{
        let __logger = &$logger;
        if __logger.is_enabled_for($crate::Level::Error) {
            __logger.exception_with_source(&format!($($arg)+), $crate::__source_info!());
        }
    }};
}

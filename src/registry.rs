//! Named logger registry
//!
//! A [`Registry`] can be created and passed around explicitly; [`global`]
//! provides a lazily-initialized process-wide one for applications that want
//! `get_logger("name")` convenience. Call [`shutdown`] before exit to flush
//! and close every file.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::config::LoggerConfig;
use crate::error::ConfigurationError;
use crate::logger::Logger;

/// Loggers keyed by name
#[derive(Default)]
pub struct Registry {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the logger named `config.name`, building it if it does not exist
    ///
    /// An existing logger is returned as-is; `config` is then ignored.
    pub fn get_or_create(&self, config: LoggerConfig) -> Result<Arc<Logger>, ConfigurationError> {
        if let Some(logger) = self.get(&config.name) {
            return Ok(logger);
        }

        let mut loggers = match self.loggers.write() {
            Ok(loggers) => loggers,
            Err(poisoned) => poisoned.into_inner(),
        };
        // another thread may have won the race between get() and write()
        if let Some(logger) = loggers.get(&config.name) {
            return Ok(Arc::clone(logger));
        }

        let name = config.name.clone();
        let logger = Arc::new(Logger::new(config)?);
        tracing::debug!(logger = %name, "registered logger");
        loggers.insert(name, Arc::clone(&logger));
        Ok(logger)
    }

    /// Register an already-built logger, replacing any with the same name
    pub fn insert(&self, logger: Logger) -> Arc<Logger> {
        let logger = Arc::new(logger);
        let previous = match self.loggers.write() {
            Ok(mut loggers) => loggers.insert(logger.name().to_string(), Arc::clone(&logger)),
            Err(poisoned) => poisoned
                .into_inner()
                .insert(logger.name().to_string(), Arc::clone(&logger)),
        };
        if let Some(previous) = previous {
            previous.flush();
        }
        logger
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers
            .read()
            .ok()
            .and_then(|loggers| loggers.get(name).cloned())
    }

    /// Remove a logger; it closes once the last handle is dropped
    pub fn remove(&self, name: &str) -> Option<Arc<Logger>> {
        match self.loggers.write() {
            Ok(mut loggers) => loggers.remove(name),
            Err(poisoned) => poisoned.into_inner().remove(name),
        }
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .read()
            .map(|loggers| loggers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.loggers.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush and close every logger, then forget them
    pub fn shutdown(&self) {
        let drained: Vec<Arc<Logger>> = match self.loggers.write() {
            Ok(mut loggers) => loggers.drain().map(|(_, l)| l).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, l)| l).collect(),
        };
        for logger in &drained {
            logger.close();
        }
        tracing::debug!(count = drained.len(), "logger registry shut down");
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

/// Get or create a logger in the global registry with default options
pub fn get_logger(name: &str) -> Result<Arc<Logger>, ConfigurationError> {
    global().get_or_create(LoggerConfig::default().with_name(name))
}

/// Flush and close every logger in the global registry
pub fn shutdown() {
    if let Some(registry) = GLOBAL.get() {
        registry.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::MemoryDestination;
    use crate::formatter::Formatter;
    use crate::record::Level;
    use std::fs;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, name: &str) -> LoggerConfig {
        LoggerConfig::default()
            .with_name(name)
            .with_template("{message}")
            .with_file_path(dir.path().join(format!("{}.log", name)).to_string_lossy())
            .with_console(false)
    }

    #[test]
    fn test_get_or_create_returns_same_logger() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::new();

        let first = registry.get_or_create(file_config(&temp_dir, "api")).unwrap();
        let second = registry.get_or_create(file_config(&temp_dir, "api")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::new();
        registry.get_or_create(file_config(&temp_dir, "worker")).unwrap();
        registry.get_or_create(file_config(&temp_dir, "api")).unwrap();

        assert_eq!(registry.names(), vec!["api", "worker"]);
    }

    #[test]
    fn test_invalid_config_is_not_registered() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::new();
        let result = registry.get_or_create(file_config(&temp_dir, "bad").with_max_bytes(0));

        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let registry = Registry::new();
        let memory = Arc::new(MemoryDestination::new(10));
        registry.insert(Logger::with_destinations(
            "mem",
            Level::Info,
            Formatter::default(),
            vec![memory],
        ));

        assert!(registry.get("mem").is_some());
        assert!(registry.remove("mem").is_some());
        assert!(registry.get("mem").is_none());
    }

    #[test]
    fn test_shutdown_closes_loggers() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::new();
        let logger = registry.get_or_create(file_config(&temp_dir, "svc")).unwrap();

        logger.info("before shutdown");
        registry.shutdown();
        logger.info("after shutdown");

        assert!(registry.is_empty());
        assert_eq!(logger.destination_count(), 0);
        let content = fs::read_to_string(temp_dir.path().join("svc.log")).unwrap();
        assert_eq!(content, "before shutdown\n");
    }

    #[test]
    fn test_global_registry_is_shared() {
        assert!(std::ptr::eq(global(), global()));
    }
}

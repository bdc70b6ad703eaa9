//! Logger construction options

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::destination::{RotateWhen, RotationPolicy};
use crate::error::ConfigurationError;
use crate::formatter::{self, DEFAULT_TEMPLATE, DEFAULT_TIME_FORMAT};
use crate::record::Level;

/// Default byte bound for size-triggered rotation (5 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 5_242_880;

/// Default number of rotated-out files to keep
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// Default logger name
pub const DEFAULT_LOGGER_NAME: &str = "PyLogger";

/// Directory used for derived log file paths
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// Options for building a [`Logger`](crate::Logger)
///
/// Rotation policy resolution, when rotation is enabled: an explicit
/// `max_bytes` selects size-triggered rotation, even if `rotate_when` is also
/// set; otherwise `rotate_when` (default midnight) selects time-triggered
/// rotation. With rotation disabled the time policy is off but the file is
/// still bounded by `max_bytes` (default 5 MiB).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Logger name, also used for the derived file name
    #[serde(default = "default_name")]
    pub name: String,

    /// Calls below this level are dropped
    #[serde(default = "default_min_level")]
    pub min_level: Level,

    /// Line template, e.g. "{time} - {name} - {level} - {message}"
    #[serde(default = "default_template")]
    pub template: String,

    /// chrono strftime pattern for `{time}`
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Log file path; `~` and `$VARS` are expanded.
    /// Derived as `logs/<name>_<YYYYMMDD>.log` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default = "default_true")]
    pub rotation_enabled: bool,

    /// Byte bound; when set, selects size-triggered rotation.
    /// Also bounds the file when rotation is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,

    #[serde(default = "default_backup_count")]
    pub backup_count: usize,

    /// S, M, H, D or MIDNIGHT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_when: Option<RotateWhen>,

    #[serde(default = "default_true")]
    pub console_enabled: bool,
}

fn default_name() -> String {
    DEFAULT_LOGGER_NAME.to_string()
}

fn default_min_level() -> Level {
    Level::Info
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_backup_count() -> usize {
    DEFAULT_BACKUP_COUNT
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            min_level: default_min_level(),
            template: default_template(),
            time_format: default_time_format(),
            file_path: None,
            rotation_enabled: true,
            max_bytes: None,
            backup_count: default_backup_count(),
            rotate_when: None,
            console_enabled: true,
        }
    }
}

impl LoggerConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `~/.logwheel/config.toml`, or return defaults if not found
    pub fn load_default() -> Result<Self, ConfigurationError> {
        let path = config_file_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotation_enabled = enabled;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    pub fn with_rotate_when(mut self, when: RotateWhen) -> Self {
        self.rotate_when = Some(when);
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// The size bound, explicit or default
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes.unwrap_or(DEFAULT_MAX_BYTES)
    }

    /// Reject options that cannot produce a working logger
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_bytes == Some(0) {
            return Err(ConfigurationError::InvalidMaxBytes);
        }
        formatter::check_time_format(&self.time_format)
    }

    /// The single rotation policy for the file destination
    pub fn rotation_policy(&self) -> Result<Option<RotationPolicy>, ConfigurationError> {
        if !self.rotation_enabled {
            // no time-based rollover, but the size bound still applies
            return RotationPolicy::size(self.max_bytes()).map(Some);
        }
        match (self.max_bytes, self.rotate_when) {
            (Some(max_bytes), _) => RotationPolicy::size(max_bytes).map(Some),
            (None, when) => Ok(Some(RotationPolicy::time(when.unwrap_or_default()))),
        }
    }

    /// The configured file path after expansion, or the derived default
    pub fn resolved_file_path(&self) -> PathBuf {
        match &self.file_path {
            Some(path) => expand_path(path),
            None => default_file_path(&self.name),
        }
    }
}

/// `logs/<name>_<YYYYMMDD>.log` for today's local date
pub fn default_file_path(name: &str) -> PathBuf {
    let date = Local::now().format("%Y%m%d");
    PathBuf::from(DEFAULT_LOGS_DIR).join(format!("{}_{}.log", name, date))
}

/// Expand `~` and environment variables, leaving unknown variables as-is
fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Get the base configuration directory (~/.logwheel)
/// Falls back to ./.logwheel if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".logwheel")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".logwheel"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.name, "PyLogger");
        assert_eq!(config.min_level, Level::Info);
        assert_eq!(config.template, "{time} - {name} - {level} - {message}");
        assert!(config.rotation_enabled);
        assert_eq!(config.max_bytes(), 5_242_880);
        assert_eq!(config.backup_count, 5);
        assert!(config.console_enabled);
    }

    #[test]
    fn test_default_policy_is_midnight() {
        let policy = LoggerConfig::default().rotation_policy().unwrap();
        assert_eq!(policy, Some(RotationPolicy::time(RotateWhen::Midnight)));
    }

    #[test]
    fn test_size_wins_over_time() {
        let config = LoggerConfig::default()
            .with_max_bytes(1_048_576)
            .with_rotate_when(RotateWhen::Day);
        assert_eq!(
            config.rotation_policy().unwrap(),
            Some(RotationPolicy::SizeTriggered {
                max_bytes: 1_048_576
            })
        );
    }

    #[test]
    fn test_rotate_when_alone_selects_time() {
        let config = LoggerConfig::default().with_rotate_when(RotateWhen::Hour);
        assert_eq!(
            config.rotation_policy().unwrap(),
            Some(RotationPolicy::time(RotateWhen::Hour))
        );
    }

    #[test]
    fn test_rotation_disabled_keeps_size_bound() {
        let config = LoggerConfig::default()
            .with_rotation(false)
            .with_rotate_when(RotateWhen::Hour);
        assert_eq!(
            config.rotation_policy().unwrap(),
            Some(RotationPolicy::SizeTriggered {
                max_bytes: DEFAULT_MAX_BYTES
            })
        );

        let config = LoggerConfig::default().with_rotation(false).with_max_bytes(10);
        assert_eq!(
            config.rotation_policy().unwrap(),
            Some(RotationPolicy::SizeTriggered { max_bytes: 10 })
        );
    }

    #[test]
    fn test_invalid_time_format_is_rejected() {
        let config = LoggerConfig::default().with_time_format("%Y-%m-%d %Q");
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidTimeFormat(_))
        ));
        assert!(LoggerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_max_bytes_is_invalid() {
        let config = LoggerConfig::default().with_max_bytes(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidMaxBytes)
        ));
    }

    #[test]
    fn test_default_file_path() {
        let path = LoggerConfig::default().with_name("MyProject").resolved_file_path();
        let today = Local::now().format("%Y%m%d").to_string();
        assert_eq!(path, PathBuf::from("logs").join(format!("MyProject_{}.log", today)));
    }

    #[test]
    fn test_file_path_tilde_expansion() {
        let config = LoggerConfig::default().with_file_path("~/logs/app.log");
        let path = config.resolved_file_path();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("logs/app.log"));
        }
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = LoggerConfig::from_toml_str(
            r#"
name = "AdvancedProject"
min_level = "debug"
max_bytes = 1048576
backup_count = 3
rotate_when = "D"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "AdvancedProject");
        assert_eq!(config.min_level, Level::Debug);
        assert_eq!(config.max_bytes, Some(1_048_576));
        assert_eq!(config.backup_count, 3);
        assert_eq!(config.rotate_when, Some(RotateWhen::Day));
        assert!(config.console_enabled);
    }

    #[test]
    fn test_parse_rejects_unknown_interval() {
        let result = LoggerConfig::from_toml_str(r#"rotate_when = "W7""#);
        match result {
            Err(ConfigurationError::Parse(message)) => assert!(message.contains("W7")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_negative_max_bytes() {
        assert!(LoggerConfig::from_toml_str("max_bytes = -1").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = LoggerConfig::default()
            .with_name("RoundTrip")
            .with_level(Level::Warning)
            .with_rotate_when(RotateWhen::Minute);
        let toml_str = config.to_toml_string().unwrap();
        let parsed = LoggerConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_dir_does_not_panic() {
        let dir = config_dir();
        assert!(dir.ends_with(".logwheel"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = LoggerConfig::load(Path::new("/nonexistent/logwheel.toml"));
        assert!(matches!(result, Err(ConfigurationError::Read { .. })));
    }
}

//! Runtime configuration for hosts embedding the conference core.
//!
//! # Responsibility
//! - Collect store path, logging and lock-wait settings in one place.
//! - Load them from a JSON file or from `CONFERENCE_*` environment variables.
//!
//! # Invariants
//! - A validated config has a non-blank db path and a non-zero busy timeout.

use crate::db::OpenOptions;
use crate::logging::{default_log_level, LogLevel};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "CONFERENCE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CONFERENCE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CONFERENCE_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "CONFERENCE_BUSY_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "conference.sqlite3";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration loading/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Lock wait bound for store transactions, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Builds a config from `CONFERENCE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|dir| !dir.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "busy_timeout_ms",
                        message: format!("`{raw}` is not a whole number of milliseconds"),
                    })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.log_level.parse::<LogLevel>() {
            return Err(ConfigError::InvalidValue {
                field: "log_level",
                message: err.to_string(),
            });
        }
        if self.db_path.to_string_lossy().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "db_path",
                message: "must not be blank".to_string(),
            });
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "busy_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Connection options derived from this config.
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.open_options().busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/tmp/conf.db"),
            (ENV_LOG_DIR, "/var/log/conference"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]);
        let config = CoreConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.db_path, PathBuf::from("/tmp/conf.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/conference")));
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = CoreConfig::from_lookup(|name| {
            (name == ENV_BUSY_TIMEOUT_MS).then(|| "soon".to_string())
        })
        .expect_err("non-numeric timeout");
        assert!(matches!(err, ConfigError::InvalidValue { field: "busy_timeout_ms", .. }));

        let err = CoreConfig::from_json_str(r#"{"busy_timeout_ms": 0}"#)
            .expect_err("zero timeout");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = CoreConfig::from_json_str(r#"{"log_level": "chatty"}"#)
            .expect_err("unknown level");
        assert!(matches!(err, ConfigError::InvalidValue { field: "log_level", .. }));
    }

    #[test]
    fn blank_db_path_is_rejected() {
        for raw in ["", "   "] {
            let err = CoreConfig::from_lookup(|name| (name == ENV_DB_PATH).then(|| raw.to_string()))
                .expect_err("blank db path");
            assert!(matches!(err, ConfigError::InvalidValue { field: "db_path", .. }));
        }
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = CoreConfig::from_json_str(r#"{"db_path": "events.db"}"#).expect("valid json");
        assert_eq!(config.db_path, PathBuf::from("events.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.log_dir, None);
    }
}

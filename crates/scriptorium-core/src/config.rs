//! Runtime configuration, read from TOML.
//!
//! ```toml
//! [notify]
//! workers = 4
//! queue_capacity = 1024
//! shutdown_timeout_ms = 5000
//! listener_timeout_ms = 30000
//!
//! [commit]
//! concurrency = "last_writer_wins"
//! ```

use crate::obs::LogFormat;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub notify: NotifyConfig,
    pub commit: CommitConfig,
    pub log: LogConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.notify.validate()
    }
}

///
/// NotifyConfig
///
/// Sizing of the shared notification worker pool.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub shutdown_timeout_ms: u64,
    /// Deadline for one listener handling one event.
    pub listener_timeout_ms: u64,
}

impl NotifyConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
    pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_LISTENER_TIMEOUT_MS: u64 = 30_000;

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    #[must_use]
    pub const fn listener_timeout(&self) -> Duration {
        Duration::from_millis(self.listener_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "notify.workers",
                message: "at least one worker is required".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "notify.queue_capacity",
                message: "queue capacity must be positive".to_string(),
            });
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "notify.shutdown_timeout_ms",
                message: "shutdown timeout must be positive".to_string(),
            });
        }
        if self.listener_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "notify.listener_timeout_ms",
                message: "listener timeout must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            shutdown_timeout_ms: Self::DEFAULT_SHUTDOWN_TIMEOUT_MS,
            listener_timeout_ms: Self::DEFAULT_LISTENER_TIMEOUT_MS,
        }
    }
}

///
/// CommitConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommitConfig {
    pub concurrency: ConcurrencyPolicy,
}

///
/// ConcurrencyPolicy
///
/// How EDIT saves treat concurrent writers of the same entry.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Load, mutate, write back with no version check. Two concurrent edits
    /// of one entry race and the later save silently wins.
    #[default]
    LastWriterWins,

    /// Saves carry the revision that was loaded; the storage port rejects
    /// them with a conflict if another write landed in between.
    RevisionCheck,
}

///
/// LogConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.notify.workers, NotifyConfig::DEFAULT_WORKERS);
        assert_eq!(config.commit.concurrency, ConcurrencyPolicy::LastWriterWins);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn explicit_values_are_read() {
        let config = Config::from_toml_str(
            r#"
            [notify]
            workers = 2
            queue_capacity = 16
            shutdown_timeout_ms = 250
            listener_timeout_ms = 40

            [commit]
            concurrency = "revision_check"

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.notify.workers, 2);
        assert_eq!(config.notify.queue_capacity, 16);
        assert_eq!(config.notify.shutdown_timeout(), Duration::from_millis(250));
        assert_eq!(config.notify.listener_timeout(), Duration::from_millis(40));
        assert_eq!(config.commit.concurrency, ConcurrencyPolicy::RevisionCheck);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn zero_workers_are_rejected() {
        let err = Config::from_toml_str("[notify]\nworkers = 0\n").unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "notify.workers",
                ..
            }
        ));
    }

    #[test]
    fn zero_listener_timeout_is_rejected() {
        let err = Config::from_toml_str("[notify]\nlistener_timeout_ms = 0\n").unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "notify.listener_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[notify]\nthreads = 3\n").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/nonexistent/scriptorium.toml").unwrap_err();

        assert!(err.to_string().contains("/nonexistent/scriptorium.toml"));
    }
}

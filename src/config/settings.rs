//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file with environment variable
//! overrides for deployment-specific values like `MORK_POLLER_LOCK`.
//!
//! # Example
//!
//! ```no_run
//! use mork_coord::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("mork.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::bus::BusConfig;
use super::gate::GateConfig;
use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Notification bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Singleton gate settings.
    #[serde(default)]
    pub gate: GateConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.gate.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Defaults with environment overrides applied, for running without a
    /// config file.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.gate.apply_env();
        config
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn validate(&self) -> Result<()> {
        if self.bus.cache_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.bus.dedup_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedup_window_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.bus.legacy_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "legacy_queue_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.gate.lock_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "lock_path" }.into());
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "format",
                    reason: format!("expected \"pretty\" or \"json\", got \"{other}\""),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse_toml("").expect("parse empty config");
        assert_eq!(config.bus.cache_size, 2048);
        assert_eq!(config.bus.dedup_window_secs, 300);
        assert_eq!(config.bus.legacy_queue_capacity, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn partial_bus_section_keeps_other_defaults() {
        let config = Config::parse_toml("[bus]\ndedup_window_secs = 60\n").expect("parse");
        assert_eq!(config.bus.dedup_window_secs, 60);
        assert_eq!(config.bus.cache_size, 2048);
    }

    #[test]
    fn zero_window_is_rejected() {
        let result = Config::parse_toml("[bus]\ndedup_window_secs = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "dedup_window_secs",
                ..
            }))
        ));
    }

    #[test]
    fn zero_cache_size_is_rejected() {
        let result = Config::parse_toml("[bus]\ncache_size = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "cache_size",
                ..
            }))
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = Config::parse_toml("[logging]\nlevel = \"debug\"\nformat = \"xml\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "format", .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[bus\ncache_size = 1");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn empty_lock_path_is_a_missing_field() {
        let result = Config::parse_toml("[gate]\nlock_path = \"\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "lock_path" }))
        ));
    }
}

//! Configuration module for Parlor.

use serde::Deserialize;
use std::path::Path;

use crate::{ParlorError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of concurrent connections.
    ///
    /// 512 on Windows, 1000 elsewhere, unless overridden.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Listen backlog passed to `listen(2)`.
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Interval, in milliseconds, of the supervisory tick that drives
    /// auto-sense checks, timer advancement, and the `process_tick` hook.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Auto-sense negotiation window, in seconds. Valid range is 2-15; the
    /// default is 2.
    #[serde(default = "default_autosense_timeout_secs")]
    pub autosense_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    23
}

fn default_max_connections() -> usize {
    if cfg!(windows) {
        512
    } else {
        1000
    }
}

fn default_backlog() -> i32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_autosense_timeout_secs() -> u64 {
    2
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            backlog: default_backlog(),
            poll_interval_ms: default_poll_interval_ms(),
            autosense_timeout_secs: default_autosense_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional path to a log file. When unset, logs go to stdout only.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ParlorError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ParlorError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_connections == 0 {
            return Err(ParlorError::Config(
                "server.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.server.autosense_timeout_secs < 2 || self.server.autosense_timeout_secs > 15 {
            return Err(ParlorError::Config(
                "server.autosense_timeout_secs must be between 2 and 15".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 23);
        assert_eq!(config.server.backlog, 5);
        assert_eq!(config.server.poll_interval_ms, 100);
        assert_eq!(config.server.autosense_timeout_secs, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 2323
max_connections = 50
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.server.port, 2323);
        assert_eq!(config.server.max_connections, 50);
        // Defaults fill in the rest.
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.backlog, 5);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 23);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");
        assert!(result.is_err());
        if let Err(ParlorError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(ParlorError::Io(_))));
    }

    #[test]
    fn test_load_from_real_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[server]\nport = 2323\n\n[logging]\nlevel = \"debug\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 2323);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_autosense_out_of_range() {
        let mut config = Config::default();
        config.server.autosense_timeout_secs = 1;
        assert!(config.validate().is_err());

        config.server.autosense_timeout_secs = 16;
        assert!(config.validate().is_err());

        config.server.autosense_timeout_secs = 15;
        assert!(config.validate().is_ok());
    }
}

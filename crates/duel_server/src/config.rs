//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `DUEL_*` environment variables, then command-line flags.

use crate::session::SessionOptions;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ServerConfig::host`].
pub const ENV_HOST: &str = "DUEL_HOST";
/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "DUEL_PORT";
/// Environment variable overriding [`ServerConfig::echo_rejections`].
pub const ENV_ECHO_REJECTIONS: &str = "DUEL_ECHO_REJECTIONS";
/// Environment variable overriding [`ServerConfig::log_filter`].
pub const ENV_LOG_FILTER: &str = "DUEL_LOG";

/// Settings for the game server process.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    host: String,

    /// TCP port to listen on.
    port: u16,

    /// `tracing` filter used when `RUST_LOG` is unset.
    log_filter: String,

    /// Echo rejected moves back to the offending client.
    echo_rejections: bool,

    /// Events buffered per connection before sends start failing.
    outbound_buffer: usize,

    /// Commands buffered in front of the session task.
    command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            log_filter: "info".to_string(),
            echo_rejections: false,
            outbound_buffer: 32,
            command_buffer: 64,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies `DUEL_*` environment overrides.
    #[instrument(skip(self))]
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = std::env::var(ENV_HOST) {
            self.host = host;
        }
        if let Ok(port) = std::env::var(ENV_PORT) {
            self.port = port.parse().map_err(|_| {
                ConfigError::new(format!("Invalid value for {}: {:?}", ENV_PORT, port))
            })?;
        }
        if let Ok(echo) = std::env::var(ENV_ECHO_REJECTIONS) {
            self.echo_rejections = parse_flag(&echo).ok_or_else(|| {
                ConfigError::new(format!(
                    "Invalid value for {}: {:?}",
                    ENV_ECHO_REJECTIONS, echo
                ))
            })?;
        }
        if let Ok(filter) = std::env::var(ENV_LOG_FILTER) {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    /// Applies command-line overrides. `None` and `false` leave values as they are.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        echo_rejections: bool,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self.echo_rejections |= echo_rejections;
        self
    }

    /// Options passed to the session.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.echo_rejections)
    }

    /// Checks values the runtime cannot accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty"));
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::new("outbound_buffer must be at least 1"));
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::new("command_buffer must be at least 1"));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    fn clear_env_vars() {
        unsafe {
            env::remove_var(ENV_HOST);
            env::remove_var(ENV_PORT);
            env::remove_var(ENV_ECHO_REJECTIONS);
            env::remove_var(ENV_LOG_FILTER);
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.port(), 4000);
        assert!(!config.echo_rejections());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9000\necho_rejections = true").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(*config.port(), 9000);
        assert!(*config.echo_rejections());
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.outbound_buffer(), 32);
    }

    #[test]
    fn test_from_file_rejects_zero_buffer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "command_buffer = 0").unwrap();

        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.message.contains("command_buffer"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ServerConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.message.starts_with("Failed to read config file"));
        assert!(err.to_string().starts_with("Config error:"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env_vars();
        unsafe {
            env::set_var(ENV_HOST, "0.0.0.0");
            env::set_var(ENV_PORT, "8080");
            env::set_var(ENV_ECHO_REJECTIONS, "yes");
            env::set_var(ENV_LOG_FILTER, "debug");
        }

        let config = ServerConfig::default().with_env().unwrap();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(*config.port(), 8080);
        assert!(*config.echo_rejections());
        assert_eq!(config.log_filter(), "debug");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_invalid_port() {
        clear_env_vars();
        unsafe {
            env::set_var(ENV_PORT, "not-a-port");
        }

        let err = ServerConfig::default().with_env().unwrap_err();
        assert!(err.message.contains(ENV_PORT));
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_invalid_flag() {
        clear_env_vars();
        unsafe {
            env::set_var(ENV_ECHO_REJECTIONS, "maybe");
        }

        assert!(ServerConfig::default().with_env().is_err());
        clear_env_vars();
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = ServerConfig::default().with_overrides(Some("::1".to_string()), Some(1234), true);
        assert_eq!(config.host(), "::1");
        assert_eq!(*config.port(), 1234);
        assert!(config.session_options().echo_rejections);

        let untouched = ServerConfig::default().with_overrides(None, None, false);
        assert_eq!(untouched, ServerConfig::default());
    }
}

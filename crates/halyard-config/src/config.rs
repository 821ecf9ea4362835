//! Configuration schema.
//!
//! [`HalyardConfig`] is the root of the configuration tree. Every section
//! rejects unknown fields, so a typo in a file is an error instead of a
//! silently ignored setting.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Root configuration for a Halyard server.
///
/// # Example
///
/// ```
/// use halyard_config::HalyardConfig;
///
/// let config = HalyardConfig::default();
/// assert!(config.server.http_addr.is_none());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HalyardConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl HalyardConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(addr) = self.server.http_addr.as_deref().filter(|a| !a.is_empty()) {
            let port = addr.rsplit_once(':').map(|(_, port)| port);
            if port.and_then(|p| p.parse::<u16>().ok()).is_none() {
                return Err(ConfigError::invalid_value(
                    "server.http_addr",
                    format!("expected host:port, got {addr}"),
                ));
            }
        }

        if let Some(tls) = &self.server.tls {
            if tls.cert_file.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value("server.tls.cert_file", "must not be empty"));
            }
            if tls.key_file.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value("server.tls.key_file", "must not be empty"));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs and an immediate close on shutdown.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// This preset is optimized for production with:
    /// - JSON log formatting
    /// - Info log level
    /// - A 30 second graceful drain
    /// - Shutdown on unhandled handler panics
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.server.shutdown_timeout_ms = 30_000;
        config.server.shutdown_on_panic = true;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to bind (e.g. "0.0.0.0:8080"). Unset or empty means the
    /// server must be given a listener.
    #[serde(default)]
    pub http_addr: Option<String>,

    /// Graceful drain budget in milliseconds. Zero or negative closes
    /// connections immediately.
    #[serde(default)]
    pub shutdown_timeout_ms: i64,

    /// Shut the server down when a handler panics.
    #[serde(default)]
    pub shutdown_on_panic: bool,

    /// Certificate and key files. Absent means plain HTTP.
    #[serde(default)]
    pub tls: Option<TlsSettings>,
}

impl ServerSettings {
    /// Returns the shutdown timeout, with negative values clamped to zero.
    ///
    /// ```
    /// use halyard_config::ServerSettings;
    /// use std::time::Duration;
    ///
    /// let settings = ServerSettings { shutdown_timeout_ms: -5, ..Default::default() };
    /// assert_eq!(settings.shutdown_timeout(), Duration::ZERO);
    /// ```
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.shutdown_timeout_ms).unwrap_or(0))
    }
}

/// TLS certificate and private key, both PEM encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsSettings {
    /// Certificate chain file.
    pub cert_file: PathBuf,

    /// Private key file.
    pub key_file: PathBuf,
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. "info", "halyard_server=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

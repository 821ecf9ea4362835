//! Builds a [`HalyardConfig`] from a preset, an optional file and
//! prefixed environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, HalyardConfig, LogFormat, TlsSettings};

/// Layered settings loader.
///
/// Each layer replaces what came before it:
/// 1. A preset (defaults, development or production)
/// 2. A TOML or JSON file, or an in-memory string
/// 3. `PREFIX__SECTION__KEY` environment variables, applied by `load`
///
/// # Example
///
/// ```no_run
/// use halyard_config::ConfigLoader;
///
/// # fn main() -> Result<(), halyard_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("halyard.toml")?
///     .with_env_prefix("HALYARD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HalyardConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader seeded with [`HalyardConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HalyardConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default settings.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HalyardConfig::default();
        self
    }

    /// Resets to [`HalyardConfig::development`].
    ///
    /// # Example
    ///
    /// ```
    /// use halyard_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HalyardConfig::development();
        self
    }

    /// Resets to [`HalyardConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HalyardConfig::production();
        self
    }

    /// Replaces the settings with the contents of a `.toml` or `.json` file.
    ///
    /// Sections missing from the file take their default values, not the
    /// values of the preset.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or unreadable, has another extension,
    /// does not parse, or names an unknown field.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the settings with `content`, parsed as `format`
    /// (`"toml"` or `"json"`, case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use halyard_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    ///     shutdown_timeout_ms = 1000
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr.as_deref(), Some("127.0.0.1:3000"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enables environment overrides for variables named
    /// `PREFIX__SECTION__KEY`, for example with `"HALYARD"`:
    /// - `HALYARD__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `HALYARD__SERVER__TLS__CERT_FILE=/etc/tls/server.crt`
    /// - `HALYARD__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads a `.env` file from the working directory (or a parent) into
    /// the process environment, if there is one.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!("invalid .env file: {e}"))),
        }
    }

    /// Applies environment overrides, validates and returns the settings.
    ///
    /// # Errors
    ///
    /// Fails on an override that does not parse or on settings that do
    /// not pass [`HalyardConfig::validate`].
    pub fn load(mut self) -> Result<HalyardConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without applying environment overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> HalyardConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HalyardConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let scoped = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&scoped)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                server.http_addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_MS"] => {
                server.shutdown_timeout_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "SHUTDOWN_ON_PANIC"] => {
                server.shutdown_on_panic = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SERVER", "TLS", "CERT_FILE"] => {
                server.tls.get_or_insert_with(empty_tls).cert_file = value.into();
            }
            ["SERVER", "TLS", "KEY_FILE"] => {
                server.tls.get_or_insert_with(empty_tls).key_file = value.into();
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Unknown keys are left to other consumers of the prefix
            _ => {}
        }

        Ok(())
    }
}

fn empty_tls() -> TlsSettings {
    TlsSettings {
        cert_file: Default::default(),
        key_file: Default::default(),
    }
}

/// Accepts true/false, 1/0, yes/no and on/off in any case.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! Server configuration types.
//!
//! This module provides configuration types for the Halyard server,
//! using the builder pattern for ergonomic construction.
//!
//! # Example
//!
//! ```rust
//! use halyard_core::StopStrategy;
//! use halyard_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .shutdown_timeout(Duration::from_secs(30))
//!     .build();
//!
//! assert_eq!(config.http_addr(), Some("0.0.0.0:8080"));
//! assert_eq!(config.stop_strategy(), StopStrategy::Graceful(Duration::from_secs(30)));
//! ```

use std::time::Duration;

use halyard_config::ServerSettings;
use halyard_core::StopStrategy;

use crate::tls::TlsFiles;

/// Default shutdown timeout: zero, which closes the server immediately.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::ZERO;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Address to bind when no listener is provided (e.g. "0.0.0.0:8080")
    http_addr: Option<String>,

    /// Graceful drain budget; zero means immediate close
    shutdown_timeout: Duration,

    /// Whether a handler panic shuts the whole server down
    shutdown_on_panic: bool,

    /// Certificate and key files, if the server speaks TLS
    tls: Option<TlsFiles>,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Builds a configuration from loaded settings.
    ///
    /// ```rust
    /// use halyard_config::ServerSettings;
    /// use halyard_server::ServerConfig;
    ///
    /// let settings = ServerSettings {
    ///     http_addr: Some("127.0.0.1:9000".to_string()),
    ///     shutdown_timeout_ms: -1,
    ///     ..ServerSettings::default()
    /// };
    ///
    /// let config = ServerConfig::from_settings(&settings);
    /// assert!(config.shutdown_timeout().is_zero());
    /// ```
    #[must_use]
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            http_addr: settings.http_addr.clone().filter(|addr| !addr.is_empty()),
            shutdown_timeout: settings.shutdown_timeout(),
            shutdown_on_panic: settings.shutdown_on_panic,
            tls: settings
                .tls
                .as_ref()
                .map(|tls| TlsFiles::new(&tls.cert_file, &tls.key_file)),
        }
    }

    /// Returns the HTTP bind address, if configured.
    #[must_use]
    pub fn http_addr(&self) -> Option<&str> {
        self.http_addr.as_deref()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the stop strategy derived from the shutdown timeout.
    #[must_use]
    pub fn stop_strategy(&self) -> StopStrategy {
        StopStrategy::from_timeout(self.shutdown_timeout)
    }

    /// Returns whether handler panics shut the server down.
    #[must_use]
    pub fn shutdown_on_panic(&self) -> bool {
        self.shutdown_on_panic
    }

    /// Returns the TLS files, if configured.
    #[must_use]
    pub fn tls(&self) -> Option<&TlsFiles> {
        self.tls.as_ref()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP bind address.
    ///
    /// # Arguments
    ///
    /// * `addr` - The address to bind to (e.g., "0.0.0.0:8080", "127.0.0.1:0")
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = Some(addr.into());
        self
    }

    /// Sets the graceful shutdown timeout.
    ///
    /// This is the maximum time the server waits for in-flight requests
    /// once the scope is cancelled. Zero closes connections immediately.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Shuts the server down when a handler panics.
    #[must_use]
    pub fn shutdown_on_panic(mut self, enabled: bool) -> Self {
        self.config.shutdown_on_panic = enabled;
        self
    }

    /// Serves TLS with the given certificate and key PEM files.
    #[must_use]
    pub fn tls(mut self, files: TlsFiles) -> Self {
        self.config.tls = Some(files);
        self
    }

    /// Builds the [`ServerConfig`] with the configured values.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

impl From<ServerConfig> for ServerConfigBuilder {
    fn from(config: ServerConfig) -> Self {
        Self { config }
    }
}

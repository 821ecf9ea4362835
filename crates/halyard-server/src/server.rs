//! HTTP server implementation.
//!
//! This module provides the Halyard HTTP server, built on Hyper and Tokio.
//! A [`Server`] is configured once, then [`Server::run`] serves requests
//! until its [`Scope`] is cancelled, a handler panic is escalated or the
//! accept loop fails.
//!
//! # Architecture
//!
//! - TCP listener, either provided or bound from the configured address
//! - One task per connection, optionally behind TLS
//! - A [`ServerHandle`] shared with the stop strategy to drain or close
//! - The shutdown coordinator from `halyard-core` tying it together
//!
//! # Example
//!
//! ```rust,no_run
//! use halyard_core::Scope;
//! use halyard_server::{text_response, IncomingRequest, Server};
//! use http::StatusCode;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scope = Scope::new();
//!
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .shutdown_timeout(Duration::from_secs(10))
//!         .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") })
//!         .build();
//!
//!     let termination = server.run(&scope).await;
//!     eprintln!("server stopped: {termination}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use halyard_core::{escalation, BoxError, Error, Escalation, Scope, Termination};
use tokio::net::TcpListener;

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::error::ConfigError;
use crate::handle::ServerHandle;
use crate::handler::{BoxHandler, Handler};
use crate::listener::ListenerSource;
use crate::panic::PanicGuard;
use crate::serve::serve;
use crate::tls::{TlsFiles, Transport};

/// The Halyard HTTP server.
///
/// Consumed by [`Server::run`]; build a new one to serve again.
pub struct Server {
    /// Server configuration
    config: ServerConfig,

    /// Pre-bound listener, used instead of the configured address
    listener: Option<TcpListener>,

    /// Request handler
    handler: Option<BoxHandler>,

    /// Caller-provided rustls configuration
    tls_config: Option<Arc<rustls::ServerConfig>>,

    /// Control handle shared with connections and the stop strategy
    handle: ServerHandle,
}

impl Server {
    /// Creates a new server with the given configuration and no handler.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            listener: None,
            handler: None,
            tls_config: None,
            handle: ServerHandle::new(),
        }
    }

    /// Creates a new server builder.
    ///
    /// # Example
    ///
    /// ```rust
    /// use halyard_server::Server;
    ///
    /// let server = Server::builder()
    ///     .http_addr("0.0.0.0:8080")
    ///     .build();
    /// assert_eq!(server.config().http_addr(), Some("0.0.0.0:8080"));
    /// ```
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a handle that can stop the server once it runs.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Returns how connections will be carried.
    ///
    /// An explicit rustls configuration wins over certificate files.
    #[must_use]
    pub fn transport(&self) -> Transport {
        match (&self.tls_config, self.config.tls()) {
            (Some(config), _) => Transport::TlsConfig(Arc::clone(config)),
            (None, Some(files)) => Transport::TlsFiles(files.clone()),
            (None, None) => Transport::Plain,
        }
    }

    /// Runs the server until it stops, returning why it stopped.
    ///
    /// Configuration errors (no handler, no address, bind failure) end the
    /// run before anything is served. Otherwise the server runs until the
    /// scope is cancelled, a handler panic is escalated (with
    /// `shutdown_on_panic`) or the accept loop fails. The scope's
    /// cancellation drains connections within the shutdown timeout, or
    /// closes them at once when it is zero.
    ///
    /// The result never is a success: even a clean shutdown reports the
    /// scope's cancellation cause.
    pub async fn run(self, scope: &Scope) -> Termination {
        let transport = self.transport();
        let Self {
            config,
            listener,
            handler,
            handle,
            ..
        } = self;

        let Some(handler) = handler else {
            return config_error(ConfigError::UnassignedHandler);
        };
        let listener = match ListenerSource::new(listener, config.http_addr()).resolve().await {
            Ok(listener) => listener,
            Err(e) => return config_error(e),
        };

        let strategy = config.stop_strategy();
        let (handler, escalation): (BoxHandler, Escalation) = if config.shutdown_on_panic() {
            let (sender, escalation) = escalation::channel();
            let guard = PanicGuard::new(handler, sender, handle.clone());
            (Arc::new(guard), escalation)
        } else {
            (handler, Escalation::none())
        };

        tracing::info!(
            strategy = ?strategy,
            shutdown_on_panic = escalation.is_present(),
            tls = transport.requires_tls(),
            "Starting server"
        );

        let stop_handle = handle.clone();
        halyard_core::run(
            scope,
            serve(listener, transport, handler, handle),
            move || async move { strategy.stop(&stop_handle).await },
            escalation,
        )
        .await
    }
}

fn config_error(err: ConfigError) -> Termination {
    tracing::error!(error = %err, "Invalid server configuration");
    Termination::new(Error::Config(BoxError::from(err)))
}

/// Builder for configuring and creating a [`Server`].
///
/// # Example
///
/// ```rust
/// use halyard_server::ServerBuilder;
/// use std::time::Duration;
///
/// let server = ServerBuilder::new()
///     .http_addr("0.0.0.0:9090")
///     .shutdown_timeout(Duration::from_secs(60))
///     .shutdown_on_panic(true)
///     .build();
/// assert!(server.config().shutdown_on_panic());
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    config_builder: ServerConfigBuilder,
    listener: Option<TcpListener>,
    handler: Option<BoxHandler>,
    tls_config: Option<Arc<rustls::ServerConfig>>,
}

impl ServerBuilder {
    /// Creates a new server builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a complete configuration, replacing settings made so far.
    ///
    /// Later builder calls still adjust it.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config_builder = ServerConfigBuilder::from(config);
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Serves on an already bound listener. Takes precedence over the
    /// address.
    #[must_use]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the request handler.
    #[must_use]
    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets the graceful shutdown timeout. Zero closes immediately.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Shuts the server down when a handler panics.
    #[must_use]
    pub fn shutdown_on_panic(mut self, enabled: bool) -> Self {
        self.config_builder = self.config_builder.shutdown_on_panic(enabled);
        self
    }

    /// Serves TLS with certificates read from PEM files at startup.
    #[must_use]
    pub fn tls(mut self, cert: impl Into<std::path::PathBuf>, key: impl Into<std::path::PathBuf>) -> Self {
        self.config_builder = self.config_builder.tls(TlsFiles::new(cert, key));
        self
    }

    /// Serves TLS with a ready rustls configuration.
    #[must_use]
    pub fn tls_config(mut self, config: Arc<rustls::ServerConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Builds the server with the configured settings.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config_builder.build(),
            listener: self.listener,
            handler: self.handler,
            tls_config: self.tls_config,
            handle: ServerHandle::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{text_response, IncomingRequest};
    use http::StatusCode;

    fn ok_handler() -> impl Handler {
        |_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") }
    }

    #[test]
    fn test_server_builder() {
        let server = Server::builder()
            .http_addr("0.0.0.0:9090")
            .shutdown_timeout(Duration::from_secs(60))
            .build();

        assert_eq!(server.config().http_addr(), Some("0.0.0.0:9090"));
        assert_eq!(server.config().shutdown_timeout(), Duration::from_secs(60));
        assert!(!server.transport().requires_tls());
    }

    #[test]
    fn test_server_builder_config() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:3000")
            .shutdown_on_panic(true)
            .build();

        let server = Server::builder()
            .http_addr("127.0.0.1:4000")
            .config(config)
            .shutdown_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(server.config().http_addr(), Some("127.0.0.1:3000"));
        assert!(server.config().shutdown_on_panic());
        assert_eq!(server.config().shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_tls_files_select_tls_transport() {
        let server = Server::builder().tls("cert.pem", "key.pem").build();
        assert!(matches!(server.transport(), Transport::TlsFiles(_)));
    }

    #[tokio::test]
    async fn test_run_without_handler() {
        let scope = Scope::new();
        let termination = Server::builder()
            .http_addr("127.0.0.1:0")
            .build()
            .run(&scope)
            .await;

        assert!(matches!(termination.primary(), Error::Config(_)));
        assert!(matches!(
            termination.find::<ConfigError>(),
            Some(ConfigError::UnassignedHandler)
        ));
    }

    #[tokio::test]
    async fn test_run_without_address() {
        let scope = Scope::new();
        let termination = Server::builder().handler(ok_handler()).build().run(&scope).await;

        assert!(matches!(
            termination.find::<ConfigError>(),
            Some(ConfigError::UnassignedAddr)
        ));
        assert_eq!(termination.to_string(), "http server address is not assigned");
    }

    #[tokio::test]
    async fn test_run_bind_failure() {
        let scope = Scope::new();
        let termination = Server::builder()
            .http_addr("not-a-valid-address")
            .handler(ok_handler())
            .build()
            .run(&scope)
            .await;

        assert!(matches!(
            termination.find::<ConfigError>(),
            Some(ConfigError::Bind { .. })
        ));
        assert!(termination.find::<std::io::Error>().is_some());
    }

    #[tokio::test]
    async fn test_server_run_and_shutdown() {
        let scope = Scope::new();
        let server = Server::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .handler(ok_handler())
            .build();

        scope.cancel();

        let termination = tokio::time::timeout(Duration::from_secs(5), server.run(&scope))
            .await
            .expect("server should stop");

        assert!(termination.is_cancelled());
        assert!(termination.secondary().is_empty());
    }
}

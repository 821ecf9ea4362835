//! # Halyard
//!
//! **Lifecycle management for HTTP servers**
//!
//! Halyard runs a request handler until its scope is cancelled, then
//! drains in-flight requests within a bounded timeout and reports exactly
//! one [`Termination`](halyard_core::Termination) explaining why the
//! server stopped:
//!
//! - **Shutdown coordination**: serve exit, scope cancellation and panic
//!   escalation are raced; the stop strategy runs at most once
//! - **Graceful or immediate stop**: a zero timeout closes at once
//! - **Panic escalation**: optionally turn a handler panic into shutdown
//! - **Layered configuration**: defaults, TOML/JSON files and env overrides
//! - **Structured logging**: `tracing` events with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use halyard::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scope = Scope::new();
//!
//!     let server = Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .shutdown_timeout(Duration::from_secs(10))
//!         .handler(|_req: IncomingRequest| async {
//!             text_response(halyard::http::StatusCode::OK, "Hello, World!")
//!         })
//!         .build();
//!
//!     let termination = server.run(&scope).await;
//!     eprintln!("server exited: {termination}");
//! }
//! ```
//!
//! ## Loading settings
//!
//! ```rust,no_run
//! use halyard::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("halyard.toml")?
//!     .with_env_prefix("HALYARD")
//!     .load()?;
//!
//! init_logging(&LogConfig::from(&config.logging))?;
//! let server = Server::new(ServerConfig::from_settings(&config.server));
//! # let _ = server;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/halyard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the shutdown coordinator
pub use halyard_core as core;

// Re-export server types
pub use halyard_server as server;

// Re-export configuration types
pub use halyard_config as config;

// Re-export logging setup
pub use halyard_telemetry as telemetry;

// Re-export HTTP types used by handlers
pub use http;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use halyard::prelude::*;
///
/// let scope = Scope::new();
/// assert!(!scope.is_cancelled());
/// ```
pub mod prelude {
    pub use halyard_core::{
        BoxError, Cause, Error, Escalation, EscalationSender, Scope, Shutdown, StopError,
        StopStrategy, Termination,
    };

    pub use halyard_server::{
        text_response, AbortHandler, Handler, HttpResponse, IncomingRequest, Server, ServerBuilder,
        ServerConfig, ServerHandle,
    };

    pub use halyard_config::{ConfigLoader, HalyardConfig, LogFormat};

    pub use halyard_telemetry::{init_logging, LogConfig};
}

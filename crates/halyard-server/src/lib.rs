//! # Halyard Server
//!
//! HTTP server plumbing for Halyard.
//!
//! This crate turns a request handler into a server whose lifetime is
//! managed by the `halyard-core` shutdown coordinator:
//!
//! - HTTP/1.1 via Hyper, plain or behind TLS (rustls)
//! - Listener resolution from a pre-bound listener or an address
//! - Graceful drain bounded by the shutdown timeout, or immediate close
//! - Optional shutdown on unhandled handler panics
//!
//! ## Example
//!
//! ```rust,no_run
//! use halyard_core::Scope;
//! use halyard_server::{text_response, IncomingRequest, Server};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scope = Scope::new();
//!
//!     let server = Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") })
//!         .build();
//!
//!     let termination = server.run(&scope).await;
//!     eprintln!("{termination}");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/halyard-server/0.1.0")]

mod config;
mod error;
mod handle;
mod handler;
mod listener;
mod panic;
mod serve;
mod server;
mod tls;
mod tracker;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{ConfigError, ServeError, TlsError};
pub use handle::ServerHandle;
pub use handler::{
    text_response, BoxHandler, Handler, HttpResponse, IncomingRequest, ResponseBody, ResponseFuture,
};
pub use panic::AbortHandler;
pub use server::{Server, ServerBuilder};
pub use tls::{load_server_config, TlsFiles, Transport};
pub use tracker::{ConnectionToken, ConnectionTracker};

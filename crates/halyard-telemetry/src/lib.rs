//! Structured logging for Halyard.
//!
//! Halyard's library crates only emit [`tracing`] events. This crate
//! installs the subscriber that renders them, as JSON for production or
//! in a human-readable form for development.
//!
//! # Example
//!
//! ```rust,no_run
//! use halyard_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).expect("logging");
//! tracing::info!(addr = "127.0.0.1:8080", "Starting server");
//! ```

#![doc(html_root_url = "https://docs.rs/halyard-telemetry/0.1.0")]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

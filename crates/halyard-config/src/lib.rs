//! Typed configuration system for Halyard.
//!
//! This crate provides strongly-typed settings for Halyard servers with
//! support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults, then file, then env)
//!
//! # Example
//!
//! ```no_run
//! use halyard_config::ConfigLoader;
//!
//! # fn main() -> Result<(), halyard_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("halyard.toml")?
//!     .with_env_prefix("HALYARD")
//!     .load()?;
//!
//! println!("shutdown timeout: {:?}", config.server.shutdown_timeout());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8443"
//! shutdown_timeout_ms = 10000
//! shutdown_on_panic = true
//!
//! [server.tls]
//! cert_file = "/etc/tls/server.crt"
//! key_file = "/etc/tls/server.key"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form
//! `PREFIX__SECTION__KEY`, for example `HALYARD__SERVER__HTTP_ADDR` or
//! `HALYARD__SERVER__TLS__CERT_FILE`.

#![doc(html_root_url = "https://docs.rs/halyard-config/0.1.0")]

mod config;
mod error;
mod loader;

pub use config::{HalyardConfig, LogFormat, LoggingSettings, ServerSettings, TlsSettings};
pub use error::ConfigError;
pub use loader::ConfigLoader;

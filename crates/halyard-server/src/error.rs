//! Server error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems detected before the serve task starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a listener nor an address was provided.
    #[error("http server address is not assigned")]
    UnassignedAddr,

    /// No request handler was provided.
    #[error("http server handler is not assigned")]
    UnassignedHandler,

    /// Binding the configured address failed.
    #[error("failed to create listener on {addr:?}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors that end the serve task.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener failed permanently.
    #[error("accepting connection: {0}")]
    Accept(#[source] io::Error),

    /// TLS could not be set up.
    #[error("{0}")]
    Tls(#[from] TlsError),
}

/// Errors raised while loading TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A certificate or key file could not be read.
    #[error("open {}: {source}", .path.display())]
    Open {
        /// File that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The certificate file holds no certificate.
    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    /// The key file holds no private key.
    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    /// rustls rejected the certificate chain or key.
    #[error("invalid tls configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

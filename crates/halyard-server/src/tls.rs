//! Transport selection and TLS loading.
//!
//! Certificate management is left to the caller; this module only reads
//! PEM files (or takes a ready rustls config) and produces an acceptor.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_rustls::TlsAcceptor;

use crate::error::TlsError;

/// Certificate chain and private key PEM files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    /// PEM file with the certificate chain, leaf first.
    pub cert: PathBuf,
    /// PEM file with the private key.
    pub key: PathBuf,
}

impl TlsFiles {
    /// Creates a new pair of TLS files.
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }
}

/// How connections are carried.
#[derive(Clone, Default)]
pub enum Transport {
    /// Plain TCP.
    #[default]
    Plain,

    /// TLS with certificates read from files when the server starts.
    TlsFiles(TlsFiles),

    /// TLS with a caller-provided rustls configuration.
    TlsConfig(Arc<rustls::ServerConfig>),
}

impl Transport {
    /// Returns `true` if connections must be wrapped in TLS.
    #[must_use]
    pub fn requires_tls(&self) -> bool {
        !matches!(self, Self::Plain)
    }

    /// Builds the TLS acceptor, or `None` for plain TCP.
    pub(crate) fn acceptor(&self) -> Result<Option<TlsAcceptor>, TlsError> {
        match self {
            Self::Plain => Ok(None),
            Self::TlsFiles(files) => load_server_config(files).map(|config| Some(TlsAcceptor::from(config))),
            Self::TlsConfig(config) => Ok(Some(TlsAcceptor::from(Arc::clone(config)))),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::TlsFiles(files) => f.debug_tuple("TlsFiles").field(files).finish(),
            Self::TlsConfig(_) => f.write_str("TlsConfig(..)"),
        }
    }
}

/// Loads a rustls server config from PEM files.
///
/// Uses the ring crypto provider and advertises `http/1.1` over ALPN.
pub fn load_server_config(files: &TlsFiles) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    let certs = rustls_pemfile::certs(&mut open(&files.cert)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Open {
            path: files.cert.clone(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(files.cert.clone()));
    }

    let key = rustls_pemfile::private_key(&mut open(&files.key)?)
        .map_err(|source| TlsError::Open {
            path: files.key.clone(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(files.key.clone()))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    tracing::debug!(cert = %files.cert.display(), "Loaded TLS certificate");
    Ok(Arc::new(config))
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Open {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_does_not_require_tls() {
        assert!(!Transport::Plain.requires_tls());
        assert!(Transport::Plain.acceptor().unwrap().is_none());
    }

    #[test]
    fn test_files_require_tls() {
        let transport = Transport::TlsFiles(TlsFiles::new("cert.pem", "key.pem"));
        assert!(transport.requires_tls());
    }

    #[test]
    fn test_missing_cert_file() {
        let transport = Transport::TlsFiles(TlsFiles::new("foo.bar", "foo.bar"));
        let err = transport.acceptor().err().unwrap();

        assert!(matches!(err, TlsError::Open { .. }));
        assert!(err.to_string().starts_with("open foo.bar: "));
    }

    #[test]
    fn test_empty_cert_file() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a certificate").unwrap();

        let files = TlsFiles::new(cert.path(), "key.pem");
        let err = load_server_config(&files).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }

    #[test]
    fn test_transport_debug_hides_config() {
        let transport = Transport::TlsFiles(TlsFiles::new("c.pem", "k.pem"));
        assert!(format!("{:?}", transport).contains("c.pem"));
    }
}

//! Listener resolution.

use tokio::net::TcpListener;

use crate::error::ConfigError;

/// Where the server accepts connections from.
#[derive(Debug)]
pub(crate) enum ListenerSource {
    /// A listener bound by the caller.
    Bound(TcpListener),
    /// An address to bind when the server starts.
    Addr(String),
    /// Nothing configured.
    Unassigned,
}

impl ListenerSource {
    pub(crate) fn new(listener: Option<TcpListener>, addr: Option<&str>) -> Self {
        match (listener, addr) {
            (Some(listener), _) => Self::Bound(listener),
            (None, Some(addr)) if !addr.is_empty() => Self::Addr(addr.to_string()),
            _ => Self::Unassigned,
        }
    }

    /// Produces a bound listener. A provided listener wins over the address.
    pub(crate) async fn resolve(self) -> Result<TcpListener, ConfigError> {
        match self {
            Self::Bound(listener) => Ok(listener),
            Self::Addr(addr) => TcpListener::bind(addr.as_str())
                .await
                .map_err(|source| ConfigError::Bind { addr, source }),
            Self::Unassigned => Err(ConfigError::UnassignedAddr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unassigned() {
        let err = ListenerSource::new(None, None).resolve().await.unwrap_err();
        assert!(matches!(err, ConfigError::UnassignedAddr));

        let err = ListenerSource::new(None, Some("")).resolve().await.unwrap_err();
        assert!(matches!(err, ConfigError::UnassignedAddr));
    }

    #[tokio::test]
    async fn test_binds_address() {
        let listener = ListenerSource::new(None, Some("127.0.0.1:0"))
            .resolve()
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_listener_wins_over_address() {
        let bound = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let expected = bound.local_addr().unwrap();

        let listener = ListenerSource::new(Some(bound), Some("not-an-address"))
            .resolve()
            .await
            .unwrap();
        assert_eq!(listener.local_addr().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_bind_failure_names_address() {
        let err = ListenerSource::new(None, Some("not-an-address"))
            .resolve()
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::Bind { .. }));
        assert!(err
            .to_string()
            .starts_with(r#"failed to create listener on "not-an-address": "#));
    }
}

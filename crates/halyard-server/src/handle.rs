//! Control handle for a running server.

use halyard_core::{BoxError, Shutdown};
use tokio_util::sync::CancellationToken;

use crate::tracker::ConnectionTracker;

/// Stops a running server.
///
/// Cloned into the serve loop, each connection task and the panic guard.
/// All operations are idempotent.
#[derive(Debug, Clone, Default)]
pub struct ServerHandle {
    closing: CancellationToken,
    abort: CancellationToken,
    tracker: ConnectionTracker,
}

impl ServerHandle {
    /// Creates a handle for a server that has not started yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops accepting connections and asks live ones to finish their
    /// in-flight request. Returns immediately.
    pub fn begin_shutdown(&self) {
        if !self.closing.is_cancelled() {
            tracing::debug!(
                connections = self.tracker.active_connections(),
                "Stopping accept loop"
            );
        }
        self.closing.cancel();
    }

    /// Stops accepting connections and drops every live one. Returns
    /// immediately.
    pub fn begin_close(&self) {
        self.begin_shutdown();
        self.abort.cancel();
    }

    /// Returns `true` once the server stopped accepting connections.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.tracker.active_connections()
    }

    pub(crate) fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub(crate) async fn closing(&self) {
        self.closing.cancelled().await;
    }

    pub(crate) async fn aborted(&self) {
        self.abort.cancelled().await;
    }
}

impl Shutdown for ServerHandle {
    async fn close(&self) -> Result<(), BoxError> {
        self.begin_close();
        self.tracker.wait_for_shutdown().await;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.begin_shutdown();
        self.tracker.wait_for_shutdown().await;
        tracing::debug!("All connections drained");
        Ok(())
    }
}

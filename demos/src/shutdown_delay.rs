//! Delayed shutdown behind a health endpoint.
//!
//! On a quit signal the service first reports itself unhealthy on
//! `/health` and keeps serving for a while, so a load balancer watching
//! the endpoint can take the instance out of rotation before the server
//! starts its own shutdown.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use halyard::core::{Cause, Scope};
use halyard::http::{StatusCode, Uri};
use halyard::server::{text_response, IncomingRequest, Server, ServerConfig};
use http_body_util::Empty;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;

use crate::group::TaskGroup;
use crate::signal::listen_for_quit_signal;

/// Status reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct HealthStatus(Arc<AtomicU16>);

impl HealthStatus {
    /// Starts out healthy.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicU16::new(StatusCode::OK.as_u16())))
    }

    /// Switches to `503 Service Unavailable`.
    pub fn signal_shutdown(&self) {
        self.0
            .store(StatusCode::SERVICE_UNAVAILABLE.as_u16(), Ordering::SeqCst);
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a scope cancelled `delay` after `scope` is.
///
/// `on_delay` runs before the wait starts. The returned scope carries the
/// cause of `scope`.
pub fn delayed_cancel(
    scope: &Scope,
    delay: Duration,
    on_delay: impl FnOnce() + Send + 'static,
) -> Scope {
    let delayed = Scope::new();
    let watched = scope.clone();
    let target = delayed.clone();

    tokio::spawn(async move {
        watched.cancelled().await;
        on_delay();
        tracing::info!(delay = ?delay, "Delaying shutdown");
        tokio::time::sleep(delay).await;
        target.cancel_with(watched.cause().unwrap_or(Cause::Cancelled));
    });

    delayed
}

/// Runs the service until a quit signal or `parent` cancellation, plus
/// the shutdown delay.
pub async fn run(
    parent: &Scope,
    listener: TcpListener,
    config: ServerConfig,
    delay: Duration,
) -> Result<(), Cause> {
    let mut group = TaskGroup::new(parent);

    let scope = group.scope().clone();
    group.spawn("quit-signal", async move { listen_for_quit_signal(&scope).await });

    let health = HealthStatus::new();
    let server_scope = delayed_cancel(group.scope(), delay, {
        let health = health.clone();
        move || health.signal_shutdown()
    });

    let server = Server::builder()
        .config(config)
        .listener(listener)
        .handler(move |req: IncomingRequest| {
            let status = health.status();
            async move {
                if req.uri().path() == "/health" {
                    text_response(status, status.canonical_reason().unwrap_or_default())
                } else {
                    text_response(StatusCode::NOT_FOUND, "not found")
                }
            }
        })
        .build();
    group.spawn("http-server", async move {
        Err(server.run(&server_scope).await.into())
    });

    group.wait().await
}

/// Polls `url` every second and logs the reported status until the scope
/// is cancelled.
pub async fn monitor_status(scope: Scope, url: Uri) {
    let client: Client<_, Empty<Bytes>> = Client::builder(TokioExecutor::new()).build_http();

    loop {
        tokio::select! {
            () = scope.cancelled() => return,
            () = tokio::time::sleep(Duration::from_secs(1)) => {}
        }

        match tokio::time::timeout(Duration::from_secs(1), client.get(url.clone())).await {
            Ok(Ok(rsp)) => tracing::info!(status = %rsp.status(), "Server reports status"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Status request failed"),
            Err(_) => tracing::warn!("Status request timed out"),
        }
    }
}

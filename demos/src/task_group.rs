//! A service made of several tasks sharing one scope: the HTTP server, a
//! quit signal listener and a periodic ticker. Whichever fails first takes
//! the others down.

use std::time::Duration;

use halyard::core::{BoxError, Cause, Scope};
use halyard::http::StatusCode;
use halyard::server::{text_response, IncomingRequest, Server, ServerConfig};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::group::TaskGroup;
use crate::signal::listen_for_quit_signal;

/// Interval between ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(2);

/// Returned by [`ticker`] once it has ticked often enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ticked {0} times, that's enough")]
pub struct TickLimit(pub u32);

/// Ticks every `period` until the scope is cancelled.
///
/// Fails with [`TickLimit`] after `max_ticks` ticks; zero ticks forever.
pub async fn ticker(scope: Scope, period: Duration, max_ticks: u32) -> Result<(), BoxError> {
    let mut count = 0;
    loop {
        tokio::select! {
            () = scope.cancelled() => return Ok(()),
            () = tokio::time::sleep(period) => {}
        }

        count += 1;
        tracing::info!(count, "tick");
        if count == max_ticks {
            return Err(TickLimit(count).into());
        }
    }
}

/// Runs the service until one of its tasks fails or `parent` is cancelled.
///
/// Always ends with an error: the server never exits cleanly.
pub async fn run(
    parent: &Scope,
    listener: TcpListener,
    config: ServerConfig,
    max_ticks: u32,
) -> Result<(), Cause> {
    let mut group = TaskGroup::new(parent);

    let scope = group.scope().clone();
    group.spawn("quit-signal", async move { listen_for_quit_signal(&scope).await });

    let scope = group.scope().clone();
    let server = Server::builder()
        .config(config)
        .listener(listener)
        .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "Hello, World!") })
        .build();
    group.spawn("http-server", async move { Err(server.run(&scope).await.into()) });

    group.spawn("ticker", ticker(group.scope().clone(), TICK_PERIOD, max_ticks));

    group.wait().await
}

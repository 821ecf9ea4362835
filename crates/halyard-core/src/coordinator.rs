//! Shutdown coordinator.
//!
//! [`run`] drives one server run: it spawns the serve task, races its exit
//! against scope cancellation and escalation, invokes the stop action at
//! most once and merges everything that went wrong into one
//! [`Termination`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

use crate::error::{BoxError, Error, StopError, Termination};
use crate::escalation::Escalation;
use crate::outcome::Outcome;
use crate::scope::{Cause, Scope};

/// Spawned serve task, aborted if dropped before it completes.
struct ServeTask {
    handle: JoinHandle<Result<(), BoxError>>,
}

impl ServeTask {
    fn spawn<F, E>(serve: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let handle = tokio::spawn(async move { serve.await.map_err(Into::into) });
        Self { handle }
    }
}

impl Future for ServeTask {
    type Output = Result<Result<(), BoxError>, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx)
    }
}

impl Drop for ServeTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

enum Trigger {
    Exited(Result<Result<(), BoxError>, JoinError>),
    Cancelled,
    Escalated(BoxError),
}

/// Runs a serve task until it exits, the scope is cancelled or a fault is
/// escalated.
///
/// - If the serve task exits first, `stop` is never called.
/// - If the scope is cancelled first, `stop` is called exactly once while
///   the serve task keeps being observed.
/// - If a fault is escalated first, `stop` is never called; whoever
///   escalated is expected to have torn the server down.
///
/// Returns only after the serve task has exited. If the returned future is
/// dropped early, the serve task is aborted.
///
/// # Example
///
/// ```rust
/// use halyard_core::{run, Escalation, Scope, StopError};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scope = Scope::new();
/// let closing = CancellationToken::new();
///
/// let serve = {
///     let closing = closing.clone();
///     async move {
///         closing.cancelled().await;
///         Ok::<(), std::io::Error>(())
///     }
/// };
/// let stop = move || async move {
///     closing.cancel();
///     Ok::<(), StopError>(())
/// };
///
/// scope.cancel();
/// let termination = run(&scope, serve, stop, Escalation::none()).await;
///
/// assert!(termination.is_cancelled());
/// assert!(termination.secondary().is_empty());
/// # }
/// ```
pub async fn run<F, E, S, SF>(
    scope: &Scope,
    serve: F,
    stop: S,
    mut escalation: Escalation,
) -> Termination
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + 'static,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<(), StopError>>,
{
    let mut serve = ServeTask::spawn(serve);
    let mut outcome = Outcome::new();
    let mut serve_done = false;

    tracing::info!(escalation = escalation.is_present(), "Server run started");

    let trigger = tokio::select! {
        exit = &mut serve => Trigger::Exited(exit),
        () = scope.cancelled() => Trigger::Cancelled,
        err = escalation.recv() => Trigger::Escalated(err),
    };

    match trigger {
        Trigger::Exited(exit) => {
            serve_done = true;
            tracing::info!("Serve task exited on its own");
            outcome.record_exit(exit);
        }
        Trigger::Cancelled => {
            let cause = scope.cause().unwrap_or(Cause::Cancelled);
            tracing::info!(cause = %cause, "Scope cancelled, stopping server");
            outcome.record(Error::Cancelled(cause));

            let stopping = stop();
            tokio::pin!(stopping);
            let mut stop_done = false;

            while !(stop_done && serve_done) {
                tokio::select! {
                    result = &mut stopping, if !stop_done => {
                        stop_done = true;
                        if let Err(err) = result {
                            outcome.record(Error::Stop(err));
                        }
                    }
                    exit = &mut serve, if !serve_done => {
                        serve_done = true;
                        outcome.record_exit(exit);
                    }
                }
            }
        }
        Trigger::Escalated(err) => {
            tracing::warn!(error = %err, "Fault escalated, skipping graceful stop");
            outcome.record(Error::Escalated(err));
        }
    }

    if !serve_done {
        outcome.record_exit((&mut serve).await);
    }

    // A clean exit is explained by a fault or cancellation that lost the race.
    let termination = match outcome.finish() {
        Some(termination) => termination,
        None => {
            if let Some(err) = escalation.try_recv() {
                Termination::new(Error::Escalated(err))
            } else if let Some(cause) = scope.cause() {
                Termination::new(Error::Cancelled(cause))
            } else {
                tracing::warn!("Serve task exited without error before shutdown was requested");
                Termination::new(Error::UnexpectedExit)
            }
        }
    };

    for err in termination.secondary() {
        tracing::warn!(error = %err, "Additional error during shutdown");
    }
    tracing::info!(reason = %termination.primary(), "Server run finished");

    termination
}

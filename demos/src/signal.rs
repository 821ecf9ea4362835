//! Quit signal listener.

use halyard::core::{BoxError, Scope};
use thiserror::Error;

/// Returned by [`listen_for_quit_signal`] when a quit signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{signal}: received quit signal")]
pub struct QuitSignal {
    /// Name of the signal that was received.
    pub signal: &'static str,
}

/// Waits for SIGINT or SIGTERM (Ctrl+C elsewhere).
///
/// Returns `Ok(())` if the scope is cancelled first, and [`QuitSignal`]
/// when a signal arrives, so a task group tells the two apart.
pub async fn listen_for_quit_signal(scope: &Scope) -> Result<(), BoxError> {
    tokio::select! {
        () = scope.cancelled() => Ok(()),
        signal = quit_signal() => Err(QuitSignal { signal: signal? }.into()),
    }
}

#[cfg(unix)]
async fn quit_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => Ok("interrupt"),
        _ = sigterm.recv() => Ok("terminated"),
    }
}

#[cfg(not(unix))]
async fn quit_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("interrupt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_quit_signal_message() {
        let err = QuitSignal { signal: "terminated" };
        assert_eq!(err.to_string(), "terminated: received quit signal");
    }

    #[tokio::test]
    async fn test_cancelled_scope_is_not_a_signal() {
        let scope = Scope::new();
        scope.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), listen_for_quit_signal(&scope))
            .await
            .expect("listener should return");
        assert!(result.is_ok());
    }
}

//! Stop strategies.
//!
//! A server is torn down either immediately or gracefully within a bounded
//! deadline. The strategy is chosen once from configuration and never
//! changes during a run.

use std::future::Future;
use std::time::Duration;

use crate::error::{BoxError, StopError};

/// Something that can be stopped.
///
/// Implemented by server handles. Both operations must be idempotent.
pub trait Shutdown: Send + Sync {
    /// Tears everything down at once, dropping in-flight work.
    fn close(&self) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Stops accepting new work and waits for in-flight work to finish.
    ///
    /// Not bounded; the caller applies any deadline.
    fn shutdown(&self) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// How to stop a running server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopStrategy {
    /// Close everything immediately.
    #[default]
    Immediate,

    /// Drain in-flight work, giving up after the deadline.
    Graceful(Duration),
}

impl StopStrategy {
    /// Selects a strategy from a shutdown timeout.
    ///
    /// A zero timeout means [`StopStrategy::Immediate`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use halyard_core::StopStrategy;
    /// use std::time::Duration;
    ///
    /// assert_eq!(StopStrategy::from_timeout(Duration::ZERO), StopStrategy::Immediate);
    /// assert_eq!(
    ///     StopStrategy::from_timeout(Duration::from_secs(5)),
    ///     StopStrategy::Graceful(Duration::from_secs(5)),
    /// );
    /// ```
    #[must_use]
    pub fn from_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            Self::Immediate
        } else {
            Self::Graceful(timeout)
        }
    }

    /// Selects a strategy from a signed millisecond value.
    ///
    /// Zero or negative values mean [`StopStrategy::Immediate`].
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let millis = u64::try_from(millis).unwrap_or(0);
        Self::from_timeout(Duration::from_millis(millis))
    }

    /// Returns the graceful deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            Self::Immediate => None,
            Self::Graceful(deadline) => Some(*deadline),
        }
    }

    /// Stops `target` according to this strategy.
    ///
    /// The graceful deadline starts when this method is called.
    pub async fn stop<S: Shutdown>(&self, target: &S) -> Result<(), StopError> {
        match *self {
            Self::Immediate => {
                tracing::info!("Closing server immediately");
                target.close().await.map_err(StopError::Failed)
            }
            Self::Graceful(deadline) => {
                tracing::info!(deadline = ?deadline, "Draining server");
                match tokio::time::timeout(deadline, target.shutdown()).await {
                    Ok(result) => result.map_err(StopError::Failed),
                    Err(_) => {
                        tracing::warn!(deadline = ?deadline, "Graceful shutdown deadline exceeded");
                        Err(StopError::DeadlineExceeded(deadline))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Target {
        closes: AtomicUsize,
        shutdowns: AtomicUsize,
        drain: Duration,
        fail: bool,
    }

    impl Shutdown for Target {
        async fn close(&self) -> Result<(), BoxError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Box::new(io::Error::new(io::ErrorKind::Other, "close failed")));
            }
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), BoxError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.drain).await;
            Ok(())
        }
    }

    #[test]
    fn test_from_timeout() {
        assert_eq!(StopStrategy::from_timeout(Duration::ZERO), StopStrategy::Immediate);
        assert_eq!(
            StopStrategy::from_timeout(Duration::from_millis(1)),
            StopStrategy::Graceful(Duration::from_millis(1))
        );
    }

    #[test]
    fn test_from_millis_clamps_negative() {
        assert_eq!(StopStrategy::from_millis(-5), StopStrategy::Immediate);
        assert_eq!(StopStrategy::from_millis(0), StopStrategy::Immediate);
        assert_eq!(
            StopStrategy::from_millis(1500).deadline(),
            Some(Duration::from_millis(1500))
        );
    }

    #[tokio::test]
    async fn test_immediate_calls_close_only() {
        let target = Target::default();
        StopStrategy::Immediate.stop(&target).await.unwrap();

        assert_eq!(target.closes.load(Ordering::SeqCst), 1);
        assert_eq!(target.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_immediate_surfaces_failure() {
        let target = Target {
            fail: true,
            ..Target::default()
        };
        let err = StopStrategy::Immediate.stop(&target).await.unwrap_err();

        assert!(matches!(err, StopError::Failed(_)));
        assert_eq!(err.to_string(), "close failed");
    }

    #[tokio::test]
    async fn test_graceful_within_deadline() {
        let target = Target {
            drain: Duration::from_millis(10),
            ..Target::default()
        };
        StopStrategy::Graceful(Duration::from_secs(1))
            .stop(&target)
            .await
            .unwrap();

        assert_eq!(target.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(target.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_graceful_deadline_exceeded() {
        let target = Target {
            drain: Duration::from_secs(2),
            ..Target::default()
        };
        let started = tokio::time::Instant::now();
        let err = StopStrategy::Graceful(Duration::from_secs(1))
            .stop(&target)
            .await
            .unwrap_err();

        assert!(err.is_deadline_exceeded());
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

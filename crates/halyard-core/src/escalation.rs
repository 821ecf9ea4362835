//! Escalation channel.
//!
//! Request-handling code uses an [`EscalationSender`] to report a fault
//! that should end the run right away, without the graceful stop. The
//! coordinator consumes at most one delivery; further deliveries are
//! dropped.

use std::future;

use tokio::sync::mpsc;

use crate::error::BoxError;

/// Creates a connected escalation pair.
///
/// # Example
///
/// ```rust
/// let (sender, escalation) = halyard_core::escalation::channel();
/// assert!(escalation.is_present());
/// assert!(sender.escalate(std::io::Error::new(std::io::ErrorKind::Other, "fault")));
/// ```
#[must_use]
pub fn channel() -> (EscalationSender, Escalation) {
    let (tx, rx) = mpsc::channel(1);
    (EscalationSender { tx }, Escalation::Present(rx))
}

/// Sending half of the escalation channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EscalationSender {
    tx: mpsc::Sender<BoxError>,
}

impl EscalationSender {
    /// Reports a fault. Never blocks.
    ///
    /// Returns `false` if the fault was dropped, either because another
    /// fault is already pending or because the run is over.
    pub fn escalate(&self, err: impl Into<BoxError>) -> bool {
        match self.tx.try_send(err.into()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(err)) => {
                tracing::debug!(error = %err, "Escalation already pending, dropping fault");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Returns `true` once the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of the escalation channel, or its absence.
#[derive(Debug, Default)]
pub enum Escalation {
    /// No escalation source. Never ready.
    #[default]
    Absent,

    /// Receiver of escalated faults.
    Present(mpsc::Receiver<BoxError>),
}

impl Escalation {
    /// An escalation source that never fires.
    #[must_use]
    pub fn none() -> Self {
        Self::Absent
    }

    /// Returns `true` if an escalation source is attached.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Takes a fault that is already pending, without waiting.
    pub(crate) fn try_recv(&mut self) -> Option<BoxError> {
        match self {
            Self::Absent => None,
            Self::Present(rx) => rx.try_recv().ok(),
        }
    }

    /// Waits for the first escalated fault.
    ///
    /// Pends forever when absent or when every sender has been dropped.
    pub(crate) async fn recv(&mut self) -> BoxError {
        match self {
            Self::Absent => future::pending().await,
            Self::Present(rx) => match rx.recv().await {
                Some(err) => err,
                None => future::pending().await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio_test::{assert_pending, assert_ready, task};

    fn fault(msg: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, msg.to_string())
    }

    #[test]
    fn test_absent_never_fires() {
        let mut escalation = Escalation::none();
        assert!(!escalation.is_present());

        let mut recv = task::spawn(escalation.recv());
        assert_pending!(recv.poll());
        assert_pending!(recv.poll());
    }

    #[test]
    fn test_present_delivers_fault() {
        let (sender, mut escalation) = channel();
        assert!(sender.escalate(fault("unhandled panic: boom")));

        let mut recv = task::spawn(escalation.recv());
        let err = assert_ready!(recv.poll());
        assert_eq!(err.to_string(), "unhandled panic: boom");
    }

    #[test]
    fn test_extra_faults_are_dropped() {
        let (sender, mut escalation) = channel();
        assert!(sender.escalate(fault("first")));
        assert!(!sender.escalate(fault("second")));

        let mut recv = task::spawn(escalation.recv());
        let err = assert_ready!(recv.poll());
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn test_try_recv() {
        let (sender, mut escalation) = channel();
        assert!(escalation.try_recv().is_none());

        sender.escalate(fault("pending"));
        assert_eq!(escalation.try_recv().unwrap().to_string(), "pending");
        assert!(Escalation::none().try_recv().is_none());
    }

    #[test]
    fn test_dropped_senders_never_fire() {
        let (sender, mut escalation) = channel();
        drop(sender);

        let mut recv = task::spawn(escalation.recv());
        assert_pending!(recv.poll());
    }

    #[test]
    fn test_escalate_after_receiver_dropped() {
        let (sender, escalation) = channel();
        drop(escalation);

        assert!(sender.is_closed());
        assert!(!sender.escalate(fault("late")));
    }
}

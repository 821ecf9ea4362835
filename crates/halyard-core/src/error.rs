//! Error types for a server run.
//!
//! Every run ends with exactly one [`Termination`]: a primary [`Error`]
//! explaining why the run ended, followed by any secondary errors observed
//! while shutting down.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::scope::Cause;

/// Boxed error used at the boundaries of the coordinator.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A single failure observed during a run.
#[derive(Debug, Error)]
pub enum Error {
    /// The serve task failed on its own.
    #[error("serve task exited with error: {0}")]
    Serve(#[source] BoxError),

    /// The execution scope was cancelled.
    #[error("{0}")]
    Cancelled(#[source] Cause),

    /// Executing the stop strategy failed.
    #[error("stopping server: {0}")]
    Stop(#[source] StopError),

    /// A fault was escalated through the escalation channel.
    #[error("{0}")]
    Escalated(#[source] BoxError),

    /// The server could not be configured; the serve task never started.
    #[error("{0}")]
    Config(#[source] BoxError),

    /// The serve task closed normally although nobody asked it to stop.
    #[error("serve task exited without error before shutdown was requested")]
    UnexpectedExit,
}

/// Errors produced by a [`StopStrategy`](crate::StopStrategy).
#[derive(Debug, Error)]
pub enum StopError {
    /// Graceful shutdown did not complete within its deadline.
    #[error("graceful shutdown deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Tearing the server down failed.
    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl StopError {
    /// Returns `true` if the graceful deadline elapsed.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }
}

/// The terminal result of a server run.
///
/// Holds at least one error. The first recorded error is the primary one;
/// everything recorded afterwards is kept, in order, as secondary errors.
/// Use [`Termination::find`] or [`Termination::contains`] to inspect
/// causes regardless of their position. [`source`](StdError::source) only
/// leads to the primary error, so a termination boxed into another error
/// has to be downcast back to `Termination` before its secondary errors can
/// be reached.
///
/// # Example
///
/// ```rust
/// use halyard_core::{Cause, Error, StopError, Termination};
/// use std::time::Duration;
///
/// let mut termination = Termination::new(Error::Cancelled(Cause::Cancelled));
/// termination.push(Error::Stop(StopError::DeadlineExceeded(Duration::from_secs(1))));
///
/// assert!(termination.is_cancelled());
/// assert!(termination.is_deadline_exceeded());
/// assert_eq!(termination.secondary().len(), 1);
/// ```
#[derive(Debug)]
pub struct Termination {
    primary: Error,
    secondary: Vec<Error>,
}

impl Termination {
    /// Creates a termination from its primary error.
    #[must_use]
    pub fn new(primary: Error) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
        }
    }

    /// Appends a secondary error.
    pub fn push(&mut self, err: Error) {
        self.secondary.push(err);
    }

    /// Returns the error that ended the run.
    #[must_use]
    pub fn primary(&self) -> &Error {
        &self.primary
    }

    /// Returns errors recorded after the primary one, in observation order.
    #[must_use]
    pub fn secondary(&self) -> &[Error] {
        &self.secondary
    }

    /// Iterates over all recorded errors, primary first.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    /// Consumes the termination, returning all errors, primary first.
    #[must_use]
    pub fn into_errors(self) -> Vec<Error> {
        let mut errors = Vec::with_capacity(1 + self.secondary.len());
        errors.push(self.primary);
        errors.extend(self.secondary);
        errors
    }

    /// Finds the first error of type `E` among all recorded errors and
    /// their source chains.
    #[must_use]
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        self.errors().find_map(|err| {
            let mut current: Option<&(dyn StdError + 'static)> = Some(err);
            while let Some(e) = current {
                if let Some(found) = e.downcast_ref::<E>() {
                    return Some(found);
                }
                current = e.source();
            }
            None
        })
    }

    /// Returns `true` if an error of type `E` was recorded anywhere.
    #[must_use]
    pub fn contains<E: StdError + 'static>(&self) -> bool {
        self.find::<E>().is_some()
    }

    /// Returns the cancellation cause, if the scope cancellation was observed.
    #[must_use]
    pub fn cause(&self) -> Option<&Cause> {
        self.errors().find_map(|err| match err {
            Error::Cancelled(cause) => Some(cause),
            _ => None,
        })
    }

    /// Returns `true` if the run observed the scope being cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cause().is_some()
    }

    /// Returns `true` if a fault was escalated.
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.errors().any(|err| matches!(err, Error::Escalated(_)))
    }

    /// Returns `true` if the graceful stop ran out of time.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        self.find::<StopError>()
            .is_some_and(StopError::is_deadline_exceeded)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for err in &self.secondary {
            write!(f, "\n{}", err)?;
        }
        Ok(())
    }
}

impl StdError for Termination {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.primary)
    }
}

impl From<Error> for Termination {
    fn from(primary: Error) -> Self {
        Self::new(primary)
    }
}

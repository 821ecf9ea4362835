//! Single-writer accumulator for the errors of one run.

use tokio::task::JoinError;

use crate::error::{BoxError, Error, Termination};

/// Collects errors in observation order.
///
/// Only the coordinator future writes to it, so no synchronisation is
/// needed.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    termination: Option<Termination>,
}

impl Outcome {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records an error. The first one becomes the primary error.
    pub(crate) fn record(&mut self, err: Error) {
        match &mut self.termination {
            Some(termination) => termination.push(err),
            None => self.termination = Some(Termination::new(err)),
        }
    }

    /// Records the exit of the serve task.
    ///
    /// The closed-normally sentinel records nothing.
    pub(crate) fn record_exit(&mut self, exit: Result<Result<(), BoxError>, JoinError>) {
        match exit {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.record(Error::Serve(err)),
            Err(join) => self.record(Error::Serve(Box::new(join))),
        }
    }

    pub(crate) fn finish(self) -> Option<Termination> {
        self.termination
    }
}

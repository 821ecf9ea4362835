//! A group of tasks sharing one scope.
//!
//! The first task to fail cancels the scope with its error as the cause,
//! so the other members wind down; [`TaskGroup::wait`] then reports that
//! first error.

use std::future::Future;
use std::sync::Arc;

use halyard::core::{BoxError, Cause, Scope};
use tokio::task::JoinSet;

/// Tasks with a shared cancellation scope.
pub struct TaskGroup {
    scope: Scope,
    tasks: JoinSet<(&'static str, Result<(), BoxError>)>,
}

impl TaskGroup {
    /// Creates a group whose scope is a child of `parent`.
    #[must_use]
    pub fn new(parent: &Scope) -> Self {
        Self {
            scope: parent.child(),
            tasks: JoinSet::new(),
        }
    }

    /// The scope shared by the group's tasks.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Spawns a member task.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.tasks.spawn(async move { (name, task.await) });
    }

    /// Waits for every task and returns the first failure.
    ///
    /// A panicking task counts as a failure.
    pub async fn wait(mut self) -> Result<(), Cause> {
        let mut first: Option<Cause> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let (name, err) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((name, Err(err))) => (name, err),
                Err(join) => ("<panicked>", BoxError::from(join)),
            };

            if first.is_some() {
                tracing::debug!(task = name, error = %err, "Task failed after group cancellation");
                continue;
            }

            tracing::info!(task = name, error = %err, "Task failed, cancelling group");
            let cause = Cause::Custom(Arc::from(err));
            self.scope.cancel_with(cause.clone());
            first = Some(cause);
        }

        first.map_or(Ok(()), Err)
    }
}

//! Cancellable execution scopes.
//!
//! A [`Scope`] is the caller-controlled lifetime boundary of a server run.
//! The shutdown coordinator only observes it: it waits for cancellation and
//! reads the [`Cause`] to explain why the run ended.
//!
//! # Example
//!
//! ```rust
//! use halyard_core::{Cause, Scope};
//!
//! let scope = Scope::new();
//! let child = scope.child();
//!
//! scope.cancel();
//!
//! assert!(child.is_cancelled());
//! assert!(child.cause().is_some_and(|c| c.is_cancelled()));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// The reason a [`Scope`] was cancelled.
///
/// Cheap to clone, so every observer of a scope can hold its own copy.
#[derive(Debug, Clone)]
pub enum Cause {
    /// Plain cancellation without a specific reason.
    Cancelled,

    /// Cancellation carrying an application-defined error.
    Custom(Arc<dyn StdError + Send + Sync>),
}

impl Cause {
    /// Creates a cause from an arbitrary error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use halyard_core::Cause;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::Other, "maintenance");
    /// let cause = Cause::custom(io);
    /// assert!(cause.downcast_ref::<std::io::Error>().is_some());
    /// ```
    pub fn custom(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(err))
    }

    /// Returns `true` for a plain cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the custom error if it is of type `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Cancelled => None,
            Self::Custom(err) => err.downcast_ref::<E>(),
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("scope cancelled"),
            Self::Custom(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl StdError for Cause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Cancelled => None,
            Self::Custom(err) => Some(err.as_ref()),
        }
    }
}

struct Inner {
    token: CancellationToken,
    cause: OnceLock<Cause>,
    parent: Option<Arc<Inner>>,
}

/// A cancellable execution scope with an inspectable cause.
///
/// Clones share the same cancellation state. Child scopes created with
/// [`Scope::child`] are cancelled together with their parent and report
/// the parent's cause unless they were cancelled first.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<Inner>,
}

impl Scope {
    /// Creates a new, live scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                cause: OnceLock::new(),
                parent: None,
            }),
        }
    }

    /// Creates a child scope.
    ///
    /// Cancelling the child does not affect the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                cause: OnceLock::new(),
                parent: Some(Arc::clone(&self.inner)),
            }),
        }
    }

    /// Cancels the scope with [`Cause::Cancelled`].
    pub fn cancel(&self) {
        self.cancel_with(Cause::Cancelled);
    }

    /// Cancels the scope with the given cause.
    ///
    /// The first cause wins; cancelling an already cancelled scope is a
    /// no-op.
    pub fn cancel_with(&self, cause: Cause) {
        if self.inner.token.is_cancelled() {
            return;
        }
        if self.inner.cause.set(cause).is_ok() {
            tracing::debug!("Scope cancelled");
        }
        self.inner.token.cancel();
    }

    /// Returns `true` once the scope (or one of its ancestors) is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the scope is cancelled.
    ///
    /// Completes immediately if it already is.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Returns why the scope was cancelled, or `None` while it is live.
    ///
    /// A scope cancelled through its raw token (see [`Scope::token`]) reports
    /// [`Cause::Cancelled`].
    #[must_use]
    pub fn cause(&self) -> Option<Cause> {
        if !self.is_cancelled() {
            return None;
        }

        let mut node = Some(&self.inner);
        while let Some(inner) = node {
            if let Some(cause) = inner.cause.get() {
                return Some(cause.clone());
            }
            node = inner.parent.as_ref();
        }
        Some(Cause::Cancelled)
    }

    /// Returns the underlying cancellation token.
    ///
    /// Useful to hand the scope to code that only understands tokens.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cancelled", &self.is_cancelled())
            .field("cause", &self.cause())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[derive(Debug, thiserror::Error)]
    #[error("maintenance window")]
    struct Maintenance;

    #[test]
    fn test_new_scope_is_live() {
        let scope = Scope::new();
        assert!(!scope.is_cancelled());
        assert!(scope.cause().is_none());
    }

    #[test]
    fn test_cancel_sets_plain_cause() {
        let scope = Scope::new();
        scope.cancel();

        assert!(scope.is_cancelled());
        assert!(scope.cause().unwrap().is_cancelled());
    }

    #[test]
    fn test_custom_cause_is_downcastable() {
        let scope = Scope::new();
        scope.cancel_with(Cause::custom(Maintenance));

        let cause = scope.cause().unwrap();
        assert!(!cause.is_cancelled());
        assert!(cause.downcast_ref::<Maintenance>().is_some());
        assert_eq!(cause.to_string(), "maintenance window");
        assert!(cause.source().unwrap().downcast_ref::<Maintenance>().is_some());
    }

    #[test]
    fn test_first_cause_wins() {
        let scope = Scope::new();
        scope.cancel_with(Cause::custom(Maintenance));
        scope.cancel();

        assert!(scope.cause().unwrap().downcast_ref::<Maintenance>().is_some());
    }

    #[test]
    fn test_clone_shares_state() {
        let scope = Scope::new();
        let clone = scope.clone();
        clone.cancel();
        assert!(scope.is_cancelled());
    }

    #[test]
    fn test_child_inherits_parent_cause() {
        let parent = Scope::new();
        let child = parent.child();

        parent.cancel_with(Cause::custom(Maintenance));

        assert!(child.is_cancelled());
        assert!(child.cause().unwrap().downcast_ref::<Maintenance>().is_some());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Scope::new();
        let child = parent.child();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert!(parent.cause().is_none());
    }

    #[test]
    fn test_cancel_on_cancelled_child_keeps_parent_cause() {
        let parent = Scope::new();
        let child = parent.child();

        parent.cancel_with(Cause::custom(Maintenance));
        child.cancel();

        assert!(child.cause().unwrap().downcast_ref::<Maintenance>().is_some());
    }

    #[test]
    fn test_raw_token_cancel_reports_plain_cause() {
        let scope = Scope::new();
        scope.token().cancel();

        assert!(scope.is_cancelled());
        assert!(scope.cause().unwrap().is_cancelled());
    }

    #[test]
    fn test_cancelled_future() {
        let scope = Scope::new();
        let mut waiter = task::spawn(scope.cancelled());

        assert_pending!(waiter.poll());
        scope.cancel();
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_cancelled_completes_across_tasks() {
        let scope = Scope::new();
        let trigger = scope.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(1), scope.cancelled())
            .await
            .expect("cancelled should complete");
    }

    #[test]
    fn test_scope_debug() {
        let scope = Scope::new();
        let debug = format!("{:?}", scope);
        assert!(debug.contains("Scope"));
        assert!(debug.contains("cancelled"));
    }
}

//! # Halyard Core
//!
//! Shutdown coordination for long-running servers.
//!
//! A server run is a race between the serve task exiting on its own, the
//! caller cancelling the execution [`Scope`], and an optional escalated
//! fault. [`run`] resolves that race, stops the server at most once and
//! reports exactly one [`Termination`].
//!
//! ## Stop strategies
//!
//! | Strategy | Behaviour |
//! |----------|-----------|
//! | [`StopStrategy::Immediate`] | [`Shutdown::close`], in-flight work is dropped |
//! | [`StopStrategy::Graceful`] | [`Shutdown::shutdown`] bounded by a fresh deadline |
//!
//! ## Example
//!
//! ```rust
//! use halyard_core::{run, Escalation, Scope, StopError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scope = Scope::new();
//!
//! let termination = run(
//!     &scope,
//!     async { Err::<(), _>(std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use")) },
//!     || async { Ok::<(), StopError>(()) },
//!     Escalation::none(),
//! )
//! .await;
//!
//! assert_eq!(termination.to_string(), "serve task exited with error: address in use");
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/halyard-core/0.1.0")]

mod coordinator;
mod error;
pub mod escalation;
mod outcome;
mod scope;
mod stop;

pub use coordinator::run;
pub use error::{BoxError, Error, StopError, Termination};
pub use escalation::{Escalation, EscalationSender};
pub use scope::{Cause, Scope};
pub use stop::{Shutdown, StopStrategy};

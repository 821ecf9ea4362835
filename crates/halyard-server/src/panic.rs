//! Shutdown on unhandled handler panics.
//!
//! When enabled, a panic escaping a request handler is treated as fatal for
//! the whole server: the fault is escalated to the coordinator, the server
//! is closed at once and the request gets a `500`.
//!
//! Panicking with [`AbortHandler`] aborts only the current request, the way
//! a handler gives up on a connection without taking the server down.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use halyard_core::EscalationSender;
use http::StatusCode;

use crate::handle::ServerHandle;
use crate::handler::{text_response, BoxHandler, Handler, HttpResponse, IncomingRequest, ResponseFuture};

/// Panic payload that aborts the current request without shutting the
/// server down.
///
/// ```rust,no_run
/// std::panic::panic_any(halyard_server::AbortHandler);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AbortHandler;

/// Handler wrapper that escalates panics.
pub(crate) struct PanicGuard {
    inner: BoxHandler,
    escalation: EscalationSender,
    handle: ServerHandle,
}

impl PanicGuard {
    pub(crate) fn new(inner: BoxHandler, escalation: EscalationSender, handle: ServerHandle) -> Self {
        Self {
            inner,
            escalation,
            handle,
        }
    }
}

impl Handler for PanicGuard {
    fn call(&self, req: IncomingRequest) -> ResponseFuture {
        let inner = BoxHandler::clone(&self.inner);
        let response = async move { inner.call(req).await };
        Box::pin(guard(
            response,
            self.escalation.clone(),
            self.handle.clone(),
        ))
    }
}

/// Awaits `response`, turning a panic into an escalation.
async fn guard<F>(response: F, escalation: EscalationSender, handle: ServerHandle) -> HttpResponse
where
    F: Future<Output = HttpResponse>,
{
    match AssertUnwindSafe(response).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            if payload.is::<AbortHandler>() {
                std::panic::resume_unwind(payload);
            }

            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "Unhandled panic in request handler, closing server");

            escalation.escalate(format!("unhandled panic: {message}"));
            handle.begin_close();

            text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

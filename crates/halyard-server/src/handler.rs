//! Request handlers.
//!
//! A [`Handler`] turns a request into a response. Any async function or
//! closure of the right shape is a handler:
//!
//! ```rust
//! use bytes::Bytes;
//! use halyard_server::{HttpResponse, IncomingRequest};
//! use http_body_util::Full;
//!
//! async fn hello(_req: IncomingRequest) -> HttpResponse {
//!     HttpResponse::new(Full::new(Bytes::from_static(b"hello")))
//! }
//!
//! let server = halyard_server::Server::builder()
//!     .http_addr("127.0.0.1:0")
//!     .handler(hello)
//!     .build();
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Type alias for an incoming HTTP request.
pub type IncomingRequest = Request<Incoming>;

/// Boxed response future returned by [`Handler::call`].
pub type ResponseFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send + 'static>>;

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Serves HTTP requests.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, req: IncomingRequest) -> ResponseFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    fn call(&self, req: IncomingRequest) -> ResponseFuture {
        Box::pin(self(req))
    }
}

/// Builds a plain-text response with the given status.
#[must_use]
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

//! Accept loop and per-connection handling.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use crate::error::ServeError;
use crate::handle::ServerHandle;
use crate::handler::{BoxHandler, IncomingRequest};
use crate::tls::Transport;

/// Accepts connections until the handle starts closing.
///
/// Returns `Ok(())` once the accept loop stopped on request. Live
/// connections keep running in their own tasks; the handle drains or
/// aborts them.
pub(crate) async fn serve(
    listener: TcpListener,
    transport: Transport,
    handler: BoxHandler,
    handle: ServerHandle,
) -> Result<(), ServeError> {
    let acceptor = transport.acceptor()?;

    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, tls = acceptor.is_some(), "Server listening"),
        Err(e) => tracing::warn!(error = %e, "Server listening on unknown address"),
    }

    loop {
        let (stream, remote_addr) = tokio::select! {
            () = handle.closing() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) if is_transient(&e) => {
                    tracing::debug!(error = %e, "Transient accept error");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    return Err(ServeError::Accept(e));
                }
            },
        };

        // A drain racing this accept may already have seen zero connections;
        // the new connection then observes `closing` and shuts itself down.
        let token = handle.tracker().acquire();
        let handler = BoxHandler::clone(&handler);
        let acceptor = acceptor.clone();
        let handle = handle.clone();

        tokio::spawn(async move {
            handle_connection(stream, remote_addr, acceptor, handler, &handle).await;
            drop(token);
        });
    }

    tracing::info!(
        connections = handle.active_connections(),
        "Stopped accepting connections"
    );
    Ok(())
}

/// Handles a single connection, optionally behind TLS.
async fn handle_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    acceptor: Option<TlsAcceptor>,
    handler: BoxHandler,
    handle: &ServerHandle,
) {
    match acceptor {
        None => serve_connection(stream, remote_addr, handler, handle).await,
        Some(acceptor) => {
            let tls = tokio::select! {
                accepted = acceptor.accept(stream) => accepted,
                () = handle.aborted() => return,
            };
            match tls {
                Ok(stream) => serve_connection(stream, remote_addr, handler, handle).await,
                Err(e) => tracing::debug!(%remote_addr, error = %e, "TLS handshake failed"),
            }
        }
    }
}

/// Serves HTTP/1.1 on one connection until it ends, drains or is aborted.
async fn serve_connection<I>(io: I, remote_addr: SocketAddr, handler: BoxHandler, handle: &ServerHandle)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req: IncomingRequest| {
        let handler = BoxHandler::clone(&handler);
        async move { Ok::<_, Infallible>(handler.call(req).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(io), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = handle.closing() => {
            tracing::debug!(%remote_addr, "Draining connection");
            conn.as_mut().graceful_shutdown();
            tokio::select! {
                result = conn.as_mut() => result,
                () = handle.aborted() => {
                    tracing::debug!(%remote_addr, "Connection aborted");
                    return;
                }
            }
        }
        () = handle.aborted() => {
            tracing::debug!(%remote_addr, "Connection aborted");
            return;
        }
    };

    if let Err(e) = result {
        tracing::debug!(%remote_addr, error = %e, "Connection error");
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::text_response;
    use http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_transient_errors() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_connection_accepted_while_closing_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, remote_addr) = listener.accept().await.unwrap();
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let handler: BoxHandler =
            Arc::new(|_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") });

        let handle = ServerHandle::new();
        handle.begin_shutdown();

        tokio::time::timeout(
            Duration::from_secs(1),
            handle_connection(stream, remote_addr, None, handler, &handle),
        )
        .await
        .expect("connection should close on its own");

        let mut buf = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(1), client.read_to_end(&mut buf))
            .await
            .expect("client should see the connection close");
        if let Err(e) = read {
            assert_eq!(e.kind(), io::ErrorKind::ConnectionReset);
        }

        let response = String::from_utf8_lossy(&buf).to_ascii_lowercase();
        assert!(response.is_empty() || response.contains("connection: close"));
    }
}

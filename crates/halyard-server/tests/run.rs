//! End-to-end server runs over real sockets.

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use halyard_core::{Error, Scope, StopError, Termination};
use halyard_server::{text_response, IncomingRequest, ServerBuilder, TlsError};
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn start(builder: ServerBuilder, scope: &Scope) -> (SocketAddr, JoinHandle<Termination>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = builder.listener(listener).build();

    let scope = scope.clone();
    let run = tokio::spawn(async move { server.run(&scope).await });
    (addr, run)
}

async fn get(addr: SocketAddr, path: &str) -> io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[tokio::test]
async fn test_serves_requests_until_cancelled() {
    let scope = Scope::new();
    let builder = ServerBuilder::new()
        .shutdown_timeout(Duration::from_secs(1))
        .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "hello") });
    let (addr, run) = start(builder, &scope).await;

    let response = get(addr, "/").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("hello"));

    scope.cancel();
    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(termination.is_cancelled());
    assert!(termination.secondary().is_empty());
}

#[tokio::test]
async fn test_graceful_deadline_exceeded_while_request_completes() {
    let scope = Scope::new();
    let canceller = scope.clone();
    let builder = ServerBuilder::new()
        .shutdown_timeout(Duration::from_secs(1))
        .handler(move |_req: IncomingRequest| {
            let scope = canceller.clone();
            async move {
                scope.cancel();
                tokio::time::sleep(Duration::from_secs(2)).await;
                text_response(StatusCode::OK, "done")
            }
        });
    let (addr, run) = start(builder, &scope).await;

    let started = Instant::now();
    let client = tokio::spawn(get(addr, "/slow"));

    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(1), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1900), "returned after {:?}", elapsed);
    assert!(termination.is_cancelled());
    assert!(termination.is_deadline_exceeded());
    assert!(matches!(
        termination.secondary(),
        [Error::Stop(StopError::DeadlineExceeded(_))]
    ));

    let response = client.await.unwrap().unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"), "got {:?}", response);
    assert!(response.ends_with("done"));
}

#[tokio::test]
async fn test_immediate_close_aborts_in_flight_requests() {
    let scope = Scope::new();
    let builder = ServerBuilder::new().handler(|_req: IncomingRequest| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        text_response(StatusCode::OK, "too late")
    });
    let (addr, run) = start(builder, &scope).await;

    let client = tokio::spawn(get(addr, "/slow"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    scope.cancel();
    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(termination.is_cancelled());
    assert!(termination.secondary().is_empty());

    let response = client.await.unwrap();
    assert!(response.map_or(true, |r| r.is_empty()));
}

#[tokio::test]
async fn test_idle_connection_does_not_delay_drain() {
    let scope = Scope::new();
    let builder = ServerBuilder::new()
        .shutdown_timeout(Duration::from_secs(5))
        .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") });
    let (addr, run) = start(builder, &scope).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut buf = [0_u8; 512];
    let n = stream.read(&mut buf).await.unwrap();
    assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

    let started = Instant::now();
    scope.cancel();
    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(termination.is_cancelled());
    assert!(!termination.is_deadline_exceeded());
}

#[tokio::test]
async fn test_missing_certificate_fails_serve_task() {
    let scope = Scope::new();
    let builder = ServerBuilder::new()
        .tls("foo.bar", "foo.bar")
        .handler(|_req: IncomingRequest| async { text_response(StatusCode::OK, "ok") });
    let (_addr, run) = start(builder, &scope).await;

    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(matches!(termination.primary(), Error::Serve(_)));
    assert!(!termination.is_cancelled());
    assert!(matches!(
        termination.find::<TlsError>(),
        Some(TlsError::Open { .. })
    ));
    assert!(termination
        .to_string()
        .starts_with("serve task exited with error: open foo.bar: "));
}

#[tokio::test]
async fn test_panic_escalates_when_enabled() {
    let scope = Scope::new();
    let builder = ServerBuilder::new()
        .shutdown_timeout(Duration::from_secs(5))
        .shutdown_on_panic(true)
        .handler(|req: IncomingRequest| async move {
            if req.uri().path() == "/panic" {
                panic!("boom");
            }
            text_response(StatusCode::OK, "ok")
        });
    let (addr, run) = start(builder, &scope).await;

    let response = get(addr, "/").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));

    let _ = get(addr, "/panic").await;

    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(termination.is_escalated());
    assert!(!termination.is_cancelled());
    assert!(!scope.is_cancelled());
    assert_eq!(termination.primary().to_string(), "unhandled panic: boom");
}

#[tokio::test]
async fn test_panic_without_guard_keeps_serving() {
    let scope = Scope::new();
    let builder = ServerBuilder::new().handler(|req: IncomingRequest| async move {
        if req.uri().path() == "/panic" {
            panic!("boom");
        }
        text_response(StatusCode::OK, "ok")
    });
    let (addr, run) = start(builder, &scope).await;

    let _ = get(addr, "/panic").await;
    let response = get(addr, "/").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));

    scope.cancel();
    let termination = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .unwrap();

    assert!(termination.is_cancelled());
    assert!(!termination.is_escalated());
}

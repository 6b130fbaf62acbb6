//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, Response};
use bot_proxy::config::SecretKey;
use bot_proxy::net::Listener;
use bot_proxy::{HttpServer, ProxyConfig, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Secret key used by every test proxy.
pub const SECRET: &str = "abc";

/// A proxy running on an ephemeral loopback port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a proxy in front of `upstream` (an origin such as `http://127.0.0.1:1234`).
pub async fn start_proxy(upstream: &str) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.auth.secret_key = SecretKey::new(SECRET);
    config.upstream.base_url = upstream.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.shutdown.drain_timeout_secs = 1;

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        shutdown,
        handle,
    }
}

/// Start an upstream that reflects the request back.
///
/// The response body is the request body, the response headers are the
/// request headers, plus `x-echo-method`, `x-echo-uri` and `x-echo-host`.
pub async fn start_echo_upstream() -> SocketAddr {
    serve(axum::Router::new().fallback(echo)).await
}

async fn echo(request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let mut response = Response::new(body);
    let headers = response.headers_mut();

    for (name, value) in parts.headers.iter() {
        if name == header::HOST || name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert("x-echo-method", HeaderValue::from_str(parts.method.as_str()).unwrap());
    headers.insert("x-echo-uri", HeaderValue::from_str(&parts.uri.to_string()).unwrap());
    if let Some(host) = parts.headers.get(header::HOST) {
        headers.insert("x-echo-host", host.clone());
    }
    response
}

/// Start an upstream that streams `size` bytes of a repeating pattern in 64 KiB chunks.
pub async fn start_blob_upstream(size: usize) -> SocketAddr {
    let app = axum::Router::new().fallback(move || async move {
        let chunks = (0..size).step_by(64 * 1024).map(move |start| {
            let end = (start + 64 * 1024).min(size);
            Ok::<_, Infallible>(Bytes::from(
                (start..end).map(pattern_byte).collect::<Vec<u8>>(),
            ))
        });
        Body::from_stream(futures_util::stream::iter(chunks))
    });
    serve(app).await
}

/// Byte at `offset` in the blob upstream's body.
pub fn pattern_byte(offset: usize) -> u8 {
    (offset % 251) as u8
}

async fn serve(app: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a mock backend that answers every connection with `response` verbatim, then closes.
pub async fn start_raw_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a mock backend that reads each request and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                std::future::pending::<()>().await;
                drop(socket);
            });
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Write `request` on a fresh connection and collect everything the server sends back.
///
/// Panics if the server keeps the connection open without answering.
pub async fn send_raw(addr: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    match tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received)).await {
        Ok(_) => received,
        Err(_) => panic!("server neither answered nor closed the connection"),
    }
}

/// HTTP client without connection pooling, so every request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

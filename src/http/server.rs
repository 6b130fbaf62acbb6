//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Serve each TCP connection in its own task (HTTP/1.1 and HTTP/2)
//! - Attach peer address and takeover handle to every request
//! - Authenticate paths and forward accepted requests upstream
//! - Drain connections on shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::config::ProxyConfig;
use crate::http::forward::{ForwardError, Forwarder};
use crate::http::response::drop_connection;
use crate::net::connection::{ConnectionControl, ConnectionGuard, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener};
use crate::routing::{Rejection, Router as ProxyRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub forwarder: Forwarder,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ForwardError> {
        let state = AppState {
            router: Arc::new(ProxyRouter::new(config.auth.secret_key.clone())),
            forwarder: Forwarder::new(&config.upstream)?,
        };

        Ok(Self {
            router: Self::build_router(state),
            config: Arc::new(config),
            tracker: ConnectionTracker::new(),
        })
    }

    /// Build the Axum router. Every method and path reaches the proxy handler.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
    }

    /// The request router, for serving through something other than [`run`](Self::run).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        let (drain_tx, _) = broadcast::channel::<()>(1);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                // Reap finished connection tasks
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let guard = self.tracker.track();
                        connections.spawn(serve_connection(
                            stream,
                            peer_addr,
                            self.router.clone(),
                            guard,
                            permit,
                            drain_tx.subscribe(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                    }
                },
            }
        }

        let _ = drain_tx.send(());
        let deadline = Duration::from_secs(self.config.shutdown.drain_timeout_secs);
        if tokio::time::timeout(deadline, self.tracker.wait_for_shutdown())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain deadline elapsed, closing remaining connections"
            );
            connections.abort_all();
        }
        while connections.join_next().await.is_some() {}

        tracing::info!("HTTP server stopped");
        Ok(())
    }

}

/// Serve one connection until it closes, is aborted by a handler, or is drained.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: Router,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
    mut drain: broadcast::Receiver<()>,
) {
    let control = ConnectionControl::new(guard.id());
    let service = ServiceExt::<Request<Incoming>>::map_request(router, {
        let control = control.clone();
        move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(control.clone());
            request.extensions_mut().insert(ConnectInfo(peer_addr));
            request
        }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder
        .serve_connection_with_upgrades(TokioIo::new(stream), TowerToHyperService::new(service));
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        tokio::select! {
            biased;
            _ = control.aborted() => {
                tracing::trace!(connection_id = %guard.id(), peer_addr = %peer_addr, "Connection aborted");
                break;
            }
            result = connection.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(connection_id = %guard.id(), error = %e, "Connection error");
                }
                break;
            }
            _ = drain.recv(), if !draining => {
                connection.as_mut().graceful_shutdown();
                draining = true;
            }
        }
    }
}

/// Main proxy handler.
/// Authenticates the path, then forwards the request or drops the connection.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let control = request.extensions().get::<ConnectionControl>().cloned();

    let target = match state
        .router
        .authorize(request.uri().path(), request.uri().query())
    {
        Ok(target) => target,
        Err(Rejection::KeyMismatch { attempted }) => {
            let remote_addr = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(provided_key = %attempted, remote_addr = %remote_addr, "Invalid key attempt");
            return drop_connection(control).await;
        }
        // Only key attempts are worth recording
        Err(_) => return drop_connection(control).await,
    };

    let method = request.method().clone();
    match state.forwarder.forward(request, &target).await {
        Ok(response) => {
            tracing::info!(
                method = %method,
                path = %target.redacted_path(),
                status = response.status().as_u16(),
                "Request forwarded"
            );
            response
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %target.redacted_path(),
                error = %e,
                "Error executing proxy request"
            );
            e.into_response()
        }
    }
}

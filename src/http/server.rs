//! HTTP server setup and the accept loop.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up the request logging layer
//! - Accept connections and serve HTTP/1.1 on each
//! - Enforce the read timeout on request headers and the write timeout
//!   on the client socket
//! - Dispatch requests to the vhost router and forwarder
//! - Drain in-flight connections on shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tower::ServiceExt;

use crate::config::ProxyConfig;
use crate::http::request::request_log_layer;
use crate::http::response::not_found;
use crate::net::{ConnectionTracker, Listener, ListenerError, WriteTimeoutStream};
use crate::observability;
use crate::proxy::Forwarder;
use crate::routing::matcher::request_host;
use crate::routing::{RouteError, Router as ProxyRouter};

/// How long shutdown waits for in-flight connections.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub forwarder: Forwarder,
}

/// HTTP server for the vhost proxy.
pub struct HttpServer {
    app: Router,
    read_timeout: Option<Duration>,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server from configuration.
    ///
    /// Fails if any vhost backend address does not parse.
    pub fn new(config: &ProxyConfig) -> Result<Self, RouteError> {
        let router = ProxyRouter::from_config(&config.vhosts)?;
        Ok(Self::with_router(Arc::new(router), config.timeout()))
    }

    /// Create a server around an already compiled route table.
    pub fn with_router(router: Arc<ProxyRouter>, timeout: Option<Duration>) -> Self {
        let state = AppState {
            router,
            forwarder: Forwarder::new(timeout),
        };

        Self {
            app: Self::build_router(state),
            read_timeout: timeout,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Build the Axum router with the logging layer around dispatch.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(request_log_layer())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Returns an error only for accept failures that are not tied to a
    /// single connection.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Listening to http://{}", addr);
        }

        let (drain_tx, drain_rx) = watch::channel(false);
        let mut backoff = Duration::ZERO;

        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            };

            let (stream, peer) = match accepted {
                Ok(conn) => {
                    backoff = Duration::ZERO;
                    conn
                }
                Err(e) if e.is_transient() => {
                    backoff = if backoff.is_zero() {
                        MIN_ACCEPT_BACKOFF
                    } else {
                        (backoff * 2).min(MAX_ACCEPT_BACKOFF)
                    };
                    tracing::warn!(error = %e, retry_in = ?backoff, "Accept error");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Listener failed");
                    return Err(e);
                }
            };

            self.spawn_connection(stream, peer, drain_rx.clone());
        }

        let _ = drain_tx.send(true);
        if tokio::time::timeout(DRAIN_TIMEOUT, self.tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Connections still open after drain timeout"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve one client connection on its own task.
    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, mut draining: watch::Receiver<bool>) {
        let guard = self.tracker.track();
        let connection_id = guard.id();

        let service = self
            .app
            .clone()
            .map_request(move |mut req: Request<Incoming>| {
                req.extensions_mut().insert(ConnectInfo(peer));
                req.extensions_mut().insert(connection_id);
                req
            });
        let service = TowerToHyperService::new(service);

        let mut builder = http1::Builder::new();
        if let Some(read_timeout) = self.read_timeout {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(read_timeout);
        }

        let io = TokioIo::new(WriteTimeoutStream::new(stream, self.read_timeout));

        tokio::spawn(async move {
            let _guard = guard;
            let conn = builder.serve_connection(io, service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = draining.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            };

            if let Err(e) = result {
                tracing::debug!(
                    connection_id = %connection_id,
                    peer_addr = %peer,
                    error = %e,
                    "Connection ended with error"
                );
            }
        });
    }
}

/// Main proxy handler.
/// Resolves the vhost and forwards the request to its backend.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();

    let route = state
        .router
        .match_host(request_host(&request), request.uri().path());

    let Some(route) = route else {
        tracing::debug!(path = %request.uri().path(), "No vhost matched");
        observability::metrics::record_request("none", 404, start_time);
        return not_found();
    };

    let vhost = route.name();
    match state.forwarder.forward(request, remote_addr, &route.backend).await {
        Ok(response) => {
            observability::metrics::record_request(&vhost, response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                vhost = %vhost,
                backend = %route.backend,
                error = %e,
                "proxy error"
            );
            observability::metrics::record_request(&vhost, e.status().as_u16(), start_time);
            e.into_response()
        }
    }
}

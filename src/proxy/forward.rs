//! Request forwarding to backends.
//!
//! # Responsibilities
//! - Derive the outbound request from the inbound one
//! - Execute a single round trip through the pooled HTTP client
//! - Relay the backend response with hop-by-hop headers removed
//! - Map transport failures to 502, timeouts to 504
//!
//! # Design Decisions
//! - No retries, no failover
//! - The timeout bounds connect + response head, then every wait for the
//!   next body frame; a stalled body aborts the client connection
//! - The client Host header is forwarded so backends see the vhost

use axum::body::Body;
use axum::http::{header::HOST, Extensions, Request, Response, StatusCode, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::timeout::TimeoutBody;

use crate::proxy::backend::Backend;
use crate::proxy::headers;

/// Error type for a failed round trip.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ProxyError {
    /// Status code reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Forwards requests to backends over plain HTTP/1.1.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Option<Duration>,
}

impl Forwarder {
    /// Create a forwarder whose round trips are bounded by `timeout`.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(timeout);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { client, timeout }
    }

    /// Perform one round trip to `backend` on behalf of `remote_addr`.
    pub async fn forward(
        &self,
        request: Request<Body>,
        remote_addr: SocketAddr,
        backend: &Backend,
    ) -> Result<Response<Body>, ProxyError> {
        let outbound = outbound_request(request, remote_addr, backend)?;

        let pending = self.client.request(outbound);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::Timeout(limit))??,
            None => pending.await?,
        };

        let (mut parts, body) = response.into_parts();
        headers::prepare_inbound(&mut parts.headers);

        let body = match self.timeout {
            Some(limit) => Body::new(TimeoutBody::new(limit, body)),
            None => Body::new(body),
        };

        Ok(Response::from_parts(parts, body))
    }
}

/// Derive the outbound request for `backend`.
///
/// Method, path, query, headers and body are kept; scheme and authority
/// point at the backend; `X-Forwarded-For` and `Proxy-RemoteIP` are appended.
pub fn outbound_request(
    request: Request<Body>,
    remote_addr: SocketAddr,
    backend: &Backend,
) -> Result<Request<Body>, ProxyError> {
    let (mut parts, body) = request.into_parts();

    if !parts.headers.contains_key(HOST) {
        if let Some(authority) = parts.uri.authority() {
            if let Ok(value) = authority.as_str().parse() {
                parts.headers.insert(HOST, value);
            }
        }
    }

    parts.uri = backend.target_uri(&parts.uri)?;
    parts.version = Version::HTTP_11;
    parts.extensions = Extensions::new();

    headers::prepare_outbound(&mut parts.headers);
    headers::append_forwarded_for(&mut parts.headers, remote_addr.ip());
    headers::append_remote_ip(&mut parts.headers, &remote_addr.to_string());

    Ok(Request::from_parts(parts, body))
}

//! Per-request logging.
//!
//! # Responsibilities
//! - Open one span per inbound request with a fresh request ID
//! - Emit one line per request before it is dispatched
//! - Log completion status and latency
//!
//! # Design Decisions
//! - Built on tower-http's TraceLayer so it wraps the whole dispatch chain
//! - The request ID lives in the span only; it is never forwarded

use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, OnRequest, OnResponse, TraceLayer};
use tracing::Span;
use uuid::Uuid;

use crate::net::ConnectionId;
use crate::routing::matcher::request_host;

/// Layer that logs every inbound request.
pub type RequestLogLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, LogRequest, LogResponse>;

/// Build the request logging layer.
pub fn request_log_layer() -> RequestLogLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(LogRequest)
        .on_response(LogResponse)
}

/// Creates the `request` span.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let connection_id = request
            .extensions()
            .get::<ConnectionId>()
            .map(ConnectionId::as_u64)
            .unwrap_or_default();

        tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            connection_id,
        )
    }
}

/// Logs `Request: <remote> <method> <host><uri>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

impl<B> OnRequest<B> for LogRequest {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        let host = request_host(request).unwrap_or_default();
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        tracing::info!(
            remote_addr = %remote_addr,
            method = %request.method(),
            host = %host,
            path = %target,
            "Request: {} {} {}{}",
            remote_addr,
            request.method(),
            host,
            target
        );
    }
}

/// Logs the final status at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        tracing::debug!(
            status = response.status().as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request finished"
        );
    }
}

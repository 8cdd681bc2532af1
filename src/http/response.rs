//! Response construction for requests the proxy answers itself.
//!
//! # Design Decisions
//! - Unmatched vhosts get a plain 404, never a backend round trip
//! - Backend failures carry only the status code (502 or 504)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::proxy::ProxyError;

/// Response for requests whose host matches no vhost.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

//! Header manipulation for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append X-Forwarded-For and Proxy-RemoteIP to outbound requests
//!
//! # Design Decisions
//! - Headers named by `Connection` are treated as hop-by-hop too
//! - Proxy-RemoteIP is derived by splitting the remote address on `:` and
//!   keeping the first segment, so bracketed IPv6 peers yield `[`

use axum::http::header::{HeaderName, HeaderValue, CONNECTION, TE};
use axum::http::HeaderMap;
use std::net::IpAddr;

/// Header carrying the caller's address on every forwarded request.
pub const PROXY_REMOTE_IP: HeaderName = HeaderName::from_static("proxy-remoteip");

/// Header carrying the chain of client addresses.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_HEADERS: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_HEADERS {
        headers.remove(*name);
    }
}

/// Prepare inbound request headers for the backend.
///
/// Hop-by-hop headers are dropped, `TE: trailers` survives since it
/// concerns the message rather than the connection.
pub fn prepare_outbound(headers: &mut HeaderMap) {
    let wants_trailers = headers
        .get_all(TE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("trailers"));

    strip_hop_by_hop(headers);

    if wants_trailers {
        headers.insert(TE, HeaderValue::from_static("trailers"));
    }
}

/// Prepare backend response headers for the client.
pub fn prepare_inbound(headers: &mut HeaderMap) {
    // Content framing is re-derived by the client-facing connection.
    strip_hop_by_hop(headers);
}

/// Caller address with the port removed.
///
/// Splits on `:` and keeps the first segment; an address without `:` is
/// returned whole.
pub fn remote_ip(remote_addr: &str) -> &str {
    remote_addr.split(':').next().unwrap_or(remote_addr)
}

/// Append `Proxy-RemoteIP` for the given remote socket address string.
pub fn append_remote_ip(headers: &mut HeaderMap, remote_addr: &str) {
    if let Ok(value) = HeaderValue::from_str(remote_ip(remote_addr)) {
        headers.append(PROXY_REMOTE_IP, value);
    }
}

/// Append the client IP to `X-Forwarded-For`, folding prior values into one.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client_ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client_ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

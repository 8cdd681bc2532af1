//! Vhost pattern matching logic.
//!
//! # Responsibilities
//! - Split a vhost key into host and path prefix
//! - Normalize request hosts (strip port, lowercase)
//! - Match request paths against pattern prefixes
//!
//! # Design Decisions
//! - Host matching is case-insensitive, as DNS names are
//! - Path matching is case-sensitive
//! - A key registers as key + "/", so a bare host covers every path
//! - No regex to guarantee O(n) matching

use axum::http::{header::HOST, Request};

/// A compiled vhost pattern: `host` + `path_prefix`, where the prefix always
/// ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhostPattern {
    host: String,
    path_prefix: String,
}

impl VhostPattern {
    /// Compile a vhost key such as `a.example.com` or `a.example.com/api`.
    pub fn new(key: &str) -> Self {
        let pattern = format!("{}/", key);
        let split = pattern.find('/').unwrap_or(pattern.len());
        let (host, path) = pattern.split_at(split);

        let mut path_prefix = path.to_string();
        while path_prefix.ends_with("//") {
            path_prefix.pop();
        }

        Self {
            host: normalize_host(host),
            path_prefix,
        }
    }

    /// Normalized host part; empty for the catch-all pattern.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// The pattern as registered, e.g. `a.example.com/`.
    pub fn as_registered(&self) -> String {
        format!("{}{}", self.host, self.path_prefix)
    }

    /// True if `path` falls under this pattern's prefix.
    pub fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.path_prefix)
    }
}

/// Lowercase a host and strip any `:port` suffix.
///
/// Bracketed IPv6 literals keep their brackets.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let stripped = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rfind(':') {
            Some(idx) if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &host[..idx],
            _ => host,
        }
    };
    stripped.to_ascii_lowercase()
}

/// The host a request is addressed to.
///
/// The absolute-form URI authority wins over the `Host` header, as in
/// HTTP/1.1 request targeting rules.
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    if let Some(authority) = req.uri().authority() {
        return Some(authority.as_str());
    }
    req.headers().get(HOST).and_then(|h| h.to_str().ok())
}

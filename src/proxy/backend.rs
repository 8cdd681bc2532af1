//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent the single upstream server a vhost forwards to
//! - Validate the configured address once, at startup
//! - Rewrite inbound request URIs to target the backend
//!
//! # Design Decisions
//! - Addresses are parsed as `http://` + address (no TLS to backends)
//! - An address may carry a base path and query, merged into every request

use axum::http::uri::{Authority, InvalidUri, PathAndQuery, Scheme};
use axum::http::Uri;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Error produced when a backend address cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend address {address:?}: {source}")]
    Url {
        address: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend address {0:?} has no host")]
    MissingHost(String),
    #[error("backend address {address:?} is not a valid authority: {source}")]
    Authority {
        address: String,
        #[source]
        source: InvalidUri,
    },
}

/// A single backend server.
#[derive(Debug, Clone)]
pub struct Backend {
    /// The address as configured.
    address: String,
    /// host[:port] used for every outbound request.
    authority: Authority,
    /// Base path joined in front of request paths ("/" when absent).
    base_path: String,
    /// Base query merged with request queries.
    base_query: Option<String>,
}

impl Backend {
    /// Parse a configured backend address such as `127.0.0.1:9001`.
    pub fn parse(address: &str) -> Result<Self, BackendError> {
        let url = Url::parse(&format!("http://{}", address)).map_err(|source| BackendError::Url {
            address: address.to_string(),
            source,
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BackendError::MissingHost(address.to_string()))?;

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|source| BackendError::Authority {
            address: address.to_string(),
            source,
        })?;

        Ok(Self {
            address: address.to_string(),
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().map(str::to_string),
        })
    }

    /// The address as it appeared in the configuration.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Build the outbound URI for an inbound request URI.
    ///
    /// Scheme becomes `http`, authority becomes the backend's, the path is
    /// joined onto the base path and the queries are concatenated.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, uri.path());

        let base_query = self.base_query.as_deref().unwrap_or("");
        let request_query = uri.query().unwrap_or("");
        let query = if base_query.is_empty() || request_query.is_empty() {
            format!("{}{}", base_query, request_query)
        } else {
            format!("{}&{}", base_query, request_query)
        };

        let path_and_query = if query.is_empty() {
            PathAndQuery::from_str(&path)?
        } else {
            PathAndQuery::from_str(&format!("{}?{}", path, query))?
        };

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Join two path segments with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

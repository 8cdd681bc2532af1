//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled vhost routes
//! - Look up the backend for a (host, path) pair
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap
//! - O(n) path prefix scan per host, longest prefix first
//! - Duplicate keys: last registration wins
//! - Explicit NoMatch rather than silent default

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::VhostConfig;
use crate::proxy::backend::{Backend, BackendError};
use crate::routing::matcher::{normalize_host, VhostPattern};

/// Error building the route table.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("vhost {vhost:?}: {source}")]
    Backend {
        vhost: String,
        #[source]
        source: BackendError,
    },
}

/// A single compiled route.
#[derive(Debug)]
pub struct VhostRoute {
    pub pattern: VhostPattern,
    pub backend: Backend,
}

impl VhostRoute {
    /// Display name used for logs and metrics.
    pub fn name(&self) -> String {
        self.pattern.as_registered()
    }
}

/// Immutable vhost routing table.
#[derive(Debug, Default)]
pub struct Router {
    /// Routes per normalized host, longest path prefix first.
    hosts: HashMap<String, Vec<Arc<VhostRoute>>>,
}

impl Router {
    /// Compile routes from configuration.
    ///
    /// Fails on the first backend address that does not parse.
    pub fn from_config(vhosts: &[VhostConfig]) -> Result<Self, RouteError> {
        let mut hosts: HashMap<String, Vec<Arc<VhostRoute>>> = HashMap::new();

        for vhost in vhosts {
            let backend = Backend::parse(&vhost.host).map_err(|source| RouteError::Backend {
                vhost: vhost.vhost.clone(),
                source,
            })?;
            let pattern = VhostPattern::new(&vhost.vhost);

            tracing::info!(
                vhost = %vhost.vhost,
                backend = %backend,
                pattern = %pattern.as_registered(),
                "Setting up redirection"
            );

            let routes = hosts.entry(pattern.host().to_string()).or_default();
            if let Some(existing) = routes.iter_mut().find(|r| r.pattern == pattern) {
                tracing::warn!(
                    pattern = %pattern.as_registered(),
                    previous = %existing.backend,
                    backend = %backend,
                    "Duplicate vhost, last registration wins"
                );
                *existing = Arc::new(VhostRoute { pattern, backend });
            } else {
                routes.push(Arc::new(VhostRoute { pattern, backend }));
            }
        }

        for routes in hosts.values_mut() {
            routes.sort_by(|a, b| b.pattern.path_prefix().len().cmp(&a.pattern.path_prefix().len()));
        }

        Ok(Self { hosts })
    }

    /// Find the route for a request host and path.
    ///
    /// Host-specific patterns are tried before the catch-all (empty key).
    pub fn match_host(&self, host: Option<&str>, path: &str) -> Option<Arc<VhostRoute>> {
        let host = host.map(normalize_host).unwrap_or_default();

        let lookup = |key: &str| {
            self.hosts
                .get(key)
                .and_then(|routes| routes.iter().find(|r| r.pattern.matches_path(path)))
                .cloned()
        };

        if !host.is_empty() {
            if let Some(route) = lookup(&host) {
                return Some(route);
            }
        }
        lookup("")
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.hosts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the vhost proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind host (e.g., "0.0.0.0"). Empty means all interfaces.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Read and write timeout in seconds (0 = no timeout).
    pub timeout: u64,

    /// Logging settings.
    pub log: LogConfig,

    /// Vhost to backend table.
    pub vhosts: Vec<VhostConfig>,

    /// Optional Prometheus exporter.
    pub metrics: Option<MetricsConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout: 0,
            log: LogConfig::default(),
            vhosts: Vec::new(),
            metrics: None,
        }
    }
}

impl ProxyConfig {
    /// Address the listener binds to, as `host:port`.
    pub fn bind_address(&self) -> String {
        let host = if self.host.is_empty() { "0.0.0.0" } else { self.host.as_str() };
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// Configured timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

/// One vhost routing entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VhostConfig {
    /// Host-matching key, optionally followed by a path prefix.
    pub vhost: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub host: String,
}

impl VhostConfig {
    pub fn new(vhost: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            vhost: vhost.into(),
            host: host.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full directive).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Prometheus scrape endpoint bind address.
    pub address: String,
}

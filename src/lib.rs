//! Name-based virtual host reverse proxy.
//!
//! Requests are routed by their `Host` to exactly one backend per vhost and
//! forwarded over plain HTTP/1.1; unmatched hosts get a 404 from the proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::Listener ──▶ http::server (hyper conn, read timeout)
//!                                   │
//!                                   ▼
//!                      http::request (log line + span)
//!                                   │
//!                                   ▼
//!                      routing::Router ── no match ──▶ 404
//!                                   │
//!                                   ▼
//!                      proxy::Forwarder ──▶ Backend
//!                          (502 / 504 on failure)
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

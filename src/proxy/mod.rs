//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched VhostRoute + inbound request
//!     → backend.rs (rewrite scheme/authority/path)
//!     → headers.rs (hop-by-hop, X-Forwarded-For, Proxy-RemoteIP)
//!     → forward.rs (single round trip through pooled client)
//!     → Response relayed to the client, or 502/504
//! ```
//!
//! # Design Decisions
//! - Single backend per vhost, single attempt per request
//! - Bodies are streamed in both directions, never buffered

pub mod backend;
pub mod forward;
pub mod headers;

pub use backend::{Backend, BackendError};
pub use forward::{Forwarder, ProxyError};

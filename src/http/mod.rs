//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1 connection, read timeout)
//!     → request.rs (request span, one log line per request)
//!     → routing layer resolves the vhost (404 on miss)
//!     → proxy layer forwards to the backend
//!     → response.rs (proxy-generated statuses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_log_layer, RequestLogLayer};
pub use server::{AppState, HttpServer};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept, classify accept errors)
//!     → connection.rs (connection ids, in-flight tracking)
//!     → stream.rs (write timeout on the client socket)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - No admission control: every accepted connection is served
//! - Each connection tracked so shutdown can drain in-flight work

pub mod connection;
pub mod listener;
pub mod stream;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use stream::WriteTimeoutStream;

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → matcher.rs (normalize host, compile patterns)
//!     → router.rs (host lookup, path prefix scan)
//!     → Return: matched VhostRoute or NoMatch (404)
//!
//! Route Compilation (at startup):
//!     VhostConfig[]
//!     → Parse backend addresses (fatal on error)
//!     → Compile "key/" patterns
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::VhostPattern;
pub use router::{RouteError, Router, VhostRoute};

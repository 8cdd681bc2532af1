//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the vhost route table from validated configuration
//! - Bind the client-facing listener
//!
//! # Design Decisions
//! - Fail fast: a bad backend address or a bind failure stops startup
//! - Routes compile before the bind so no traffic arrives half-configured

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::net::{Listener, ListenerError};
use crate::routing::RouteError;

/// Fatal error before the server starts accepting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Build the server and bind its listener.
pub async fn startup(config: &ProxyConfig) -> Result<(HttpServer, Listener), StartupError> {
    let server = HttpServer::new(config)?;
    let listener = Listener::bind(&config.bind_address()).await?;
    Ok((server, listener))
}

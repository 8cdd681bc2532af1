//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every backend address parses as an HTTP authority
//! - Reject vhost keys that can never match a request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Duplicate vhost keys are allowed (last registration wins)
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::ProxyConfig;
use crate::proxy::backend::{Backend, BackendError};

/// A single semantic problem in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("vhosts[{index}] ({vhost:?}): {source}")]
    Backend {
        index: usize,
        vhost: String,
        #[source]
        source: BackendError,
    },
    #[error("vhosts[{index}]: vhost {vhost:?} contains whitespace")]
    VhostWhitespace { index: usize, vhost: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, vhost) in config.vhosts.iter().enumerate() {
        if vhost.vhost.chars().any(char::is_whitespace) {
            errors.push(ValidationError::VhostWhitespace {
                index,
                vhost: vhost.vhost.clone(),
            });
        }

        if let Err(source) = Backend::parse(&vhost.host) {
            errors.push(ValidationError::Backend {
                index,
                vhost: vhost.vhost.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Longest accepted per-task shutdown deadline.
pub const MAX_SHUTDOWN_TIMEOUT_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("shutdown.max_timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("shutdown.max_timeout_ms must not exceed {max} (got {got})")]
    TimeoutTooLong { got: u64, max: u64 },

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("logging.filter must not be empty")]
    EmptyLogFilter,

    #[error("dev_environments[{0}] must not be empty")]
    EmptyDevEnvironment(usize),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.shutdown.max_timeout_ms {
        0 => errors.push(ValidationError::ZeroTimeout),
        got if got > MAX_SHUTDOWN_TIMEOUT_MS => errors.push(ValidationError::TimeoutTooLong {
            got,
            max: MAX_SHUTDOWN_TIMEOUT_MS,
        }),
        _ => {}
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.logging.filter.trim().is_empty() {
        errors.push(ValidationError::EmptyLogFilter);
    }

    for (i, env) in config.dev_environments.iter().enumerate() {
        if env.trim().is_empty() {
            errors.push(ValidationError::EmptyDevEnvironment(i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

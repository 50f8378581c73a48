//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes valid)
//! - Validate addresses and the API mount path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::matcher::PathPattern;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("api.mount_path `{0}` must start with `/`")]
    RelativeMountPath(String),

    #[error("api.mount_path `{path}` is not a valid pattern: {reason}")]
    InvalidMountPath { path: String, reason: String },

    #[error("api.message_created_status {0} is not a valid HTTP status code")]
    InvalidStatus(u16),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let mount = &config.api.mount_path;
    if !mount.starts_with('/') {
        errors.push(ValidationError::RelativeMountPath(mount.clone()));
    } else if let Err(e) = PathPattern::parse(mount) {
        errors.push(ValidationError::InvalidMountPath {
            path: mount.clone(),
            reason: e.to_string(),
        });
    }

    let status = config.api.message_created_status;
    if StatusCode::from_u16(status).is_err() {
        errors.push(ValidationError::InvalidStatus(status));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check that every upstream base URL parses as http(s)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("upstreams.{field}: invalid base URL {value:?}")]
    InvalidBaseUrl { field: &'static str, value: String },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
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
        errors.push(ValidationError::NotPositive { field: "timeouts.request_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "timeouts.upstream_secs" });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::NotPositive { field: "security.max_body_size" });
    }
    if config.assistant.max_tokens == 0 {
        errors.push(ValidationError::NotPositive { field: "assistant.max_tokens" });
    }
    if config.assistant.model.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "assistant.model" });
    }

    for (field, value) in config.upstreams.base_urls() {
        let valid = Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidBaseUrl {
                field,
                value: value.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

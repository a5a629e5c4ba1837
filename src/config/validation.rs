//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, buffer capacity > 0)
//! - Check addresses and upstream URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Upstream URLs are checked after the environment override is applied

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("upstream `{name}`: `{url}` is not an absolute http URL")]
    InvalidUpstream { name: String, url: String },
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    validate_with(config, |name| std::env::var(name).ok())
}

pub(crate) fn validate_with(
    config: &GatewayConfig,
    lookup: impl Fn(&str) -> Option<String> + Copy,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.upstream_connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_connect_secs"));
    }
    if config.timeouts.upstream_response_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_response_secs"));
    }
    if config.forwarding.buffer_capacity == 0 {
        errors.push(ValidationError::Zero("forwarding.buffer_capacity"));
    }

    for (name, upstream) in &config.upstreams {
        let url = upstream.resolve_with(lookup);
        let valid = url::Url::parse(&url)
            .map(|u| u.scheme() == "http" && u.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidUpstream {
                name: name.clone(),
                url,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

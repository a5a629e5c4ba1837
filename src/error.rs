//! Crate-level error type for startup failures.
//!
//! Request-time failures never reach this type; they are turned into HTTP
//! responses where they happen (see `http::response`).

use thiserror::Error;

use crate::config::ConfigError;
use crate::forward::TargetError;
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("route registration failed: {0}")]
    Route(#[from] RouteError),

    #[error("invalid forwarding target: {0}")]
    Target(#[from] TargetError),

    #[error("upstream `{0}` is not configured")]
    MissingUpstream(String),

    #[error("metrics exporter failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("manifest serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

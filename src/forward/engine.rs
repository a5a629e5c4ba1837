//! Request forwarding to a fixed upstream.
//!
//! # Responsibilities
//! - Rewrite the inbound request to the target (URI, Host), strip hop-by-hop headers
//! - Send exactly one upstream request, bounded by connect and response-head timeouts
//! - Relay status, headers and body back through a [`RelayBody`]
//! - Map connection failures to 502 and timeouts to 504
//!
//! # Design Decisions
//! - Request bodies stream to the upstream, never buffered
//! - No retries: the client is built with `retry_canceled_requests(false)`
//! - Cancellation follows ownership; dropping the handler future or the
//!   response body drops the upstream request or connection

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONNECTION, HOST};
use axum::http::{HeaderMap, Request, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::forward::body::RelayBody;
use crate::forward::target::ProxyTarget;
use crate::handler::{Handler, HandlerFuture};
use crate::http::request::request_id;
use crate::observability::metrics;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwarding failure, surfaced to the client as a gateway error.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("could not build upstream request: {0}")]
    Rewrite(#[from] axum::http::Error),

    #[error("upstream {upstream} unreachable: {source}")]
    Unreachable {
        upstream: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("upstream {upstream} did not respond within {timeout:?}")]
    Timeout { upstream: String, timeout: Duration },
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Rewrite(_) | ForwardError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Rewrite(_) => "rewrite",
            ForwardError::Unreachable { .. } => "unreachable",
            ForwardError::Timeout { .. } => "timeout",
        }
    }
}

/// Shared forwarding engine. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    response_timeout: Duration,
    buffer_capacity: usize,
}

impl Forwarder {
    pub fn new(connect_timeout: Duration, response_timeout: Duration, buffer_capacity: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .retry_canceled_requests(false)
            .build(connector);

        Self {
            client,
            response_timeout,
            buffer_capacity,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Duration::from_secs(config.timeouts.upstream_connect_secs),
            Duration::from_secs(config.timeouts.upstream_response_secs),
            config.forwarding.buffer_capacity,
        )
    }

    /// Bind this engine to a fixed target, producing a route handler.
    pub fn handler(&self, target: ProxyTarget) -> ForwardHandler {
        ForwardHandler {
            forwarder: self.clone(),
            target: Arc::new(target),
        }
    }

    /// Forward one request to `target` and relay the response.
    pub async fn forward(&self, target: &ProxyTarget, request: Request<Body>) -> Result<Response, ForwardError> {
        let request_id = request_id(&request).unwrap_or("unknown").to_string();
        let outbound = rewrite_request(target, request)?;

        tracing::debug!(
            request_id = %request_id,
            method = %outbound.method(),
            upstream = %outbound.uri(),
            policy = %target.policy(),
            "Forwarding request"
        );

        let pending = self.client.request(outbound);
        let response: hyper::Response<Incoming> = match tokio::time::timeout(self.response_timeout, pending).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(ForwardError::Unreachable {
                    upstream: target.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ForwardError::Timeout {
                    upstream: target.to_string(),
                    timeout: self.response_timeout,
                })
            }
        };

        tracing::debug!(
            request_id = %request_id,
            upstream = %target,
            status = %response.status(),
            "Upstream responded"
        );

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        let body = RelayBody::new(body, target.policy(), self.buffer_capacity).with_upstream(target.to_string());
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// A route handler forwarding to one fixed [`ProxyTarget`].
#[derive(Clone)]
pub struct ForwardHandler {
    forwarder: Forwarder,
    target: Arc<ProxyTarget>,
}

impl ForwardHandler {
    pub fn target(&self) -> &ProxyTarget {
        &self.target
    }
}

impl Handler for ForwardHandler {
    fn call(&self, request: Request<Body>) -> HandlerFuture {
        let forwarder = self.forwarder.clone();
        let target = self.target.clone();
        Box::pin(async move {
            match forwarder.forward(&target, request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(upstream = %target, kind = e.kind(), error = %e, "Forwarding failed");
                    metrics::record_upstream_failure(&target.to_string(), e.kind());
                    e.into_response()
                }
            }
        })
    }
}

fn rewrite_request(target: &ProxyTarget, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();
    parts.uri = target.rewrite_uri(&parts.uri)?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    let host = HeaderValue::from_str(target.authority().as_str()).map_err(axum::http::Error::from)?;
    parts.headers.insert(HOST, host);

    Ok(Request::from_parts(parts, body))
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

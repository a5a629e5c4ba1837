//! Error responses.
//!
//! # Design Decisions
//! - Every error body has the same JSON shape: `{"error": {"code", "message"}}`
//! - Routing misses never reveal the permissions of any route
//! - Unreachable upstream → 502 Bad Gateway, upstream timeout → 504 Gateway Timeout

use axum::http::header::{HeaderValue, ALLOW};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::forward::ForwardError;
use crate::routing::RouteMiss;

/// Build a JSON error response.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message.into(),
        }
    }));
    (status, body).into_response()
}

impl IntoResponse for RouteMiss {
    fn into_response(self) -> Response {
        match self {
            RouteMiss::NotFound => {
                error_response(StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND", "No matching route found")
            }
            RouteMiss::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = error_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "METHOD_NOT_ALLOWED",
                    format!("Method not allowed, expected one of: {}", allow),
                );
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let code = match &self {
            ForwardError::Rewrite(_) => "UPSTREAM_REQUEST_INVALID",
            ForwardError::Unreachable { .. } => "UPSTREAM_UNAVAILABLE",
            ForwardError::Timeout { .. } => "UPSTREAM_TIMEOUT",
        };
        error_response(self.status(), code, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::HttpMethod;
    use http_body_util::BodyExt;
    use std::time::Duration;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = RouteMiss::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "ROUTE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow_header() {
        let response =
            RouteMiss::MethodNotAllowed(vec![HttpMethod::Get, HttpMethod::Delete]).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, DELETE");
    }

    #[tokio::test]
    async fn test_timeout_is_gateway_timeout() {
        let response = ForwardError::Timeout {
            upstream: "http://127.0.0.1:1/api/chat".into(),
            timeout: Duration::from_secs(3),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    }
}

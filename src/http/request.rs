//! Request helpers.
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing
//! - The same ID is forwarded upstream unchanged as an ordinary header

use axum::http::Request;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The correlation ID of a request, if one was assigned.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}

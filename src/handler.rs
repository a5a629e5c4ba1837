//! The contract every route target satisfies.
//!
//! A handler takes the whole inbound request and produces a response whose
//! body may stream. Path variables captured by the router travel in the
//! request extensions as [`PathParams`](crate::routing::PathParams), next to
//! the [`MatchedRoute`](crate::routing::MatchedRoute) metadata.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

/// Future returned by [`Handler::call`].
pub type HandlerFuture = BoxFuture<'static, Response>;

/// Shared, type-erased handler stored in the route table.
pub type BoxHandler = Arc<dyn Handler>;

/// A terminal route handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request<Body>) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request<Body>) -> HandlerFuture {
        Box::pin(self(request))
    }
}

/// Erase a handler for storage in the route table.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

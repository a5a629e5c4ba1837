//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener, shut down gracefully
//! - Dispatch requests through the route table to their handlers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::forward::Forwarder;
use crate::http::request::request_id;
use crate::lifecycle::shutdown;
use crate::observability::metrics::{self, UNMATCHED_ROUTE};
use crate::routing::RouteTable;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl HttpServer {
    /// Build the full gateway: forwarding engine, route catalog, middleware.
    ///
    /// Fails if any route registration is invalid or ambiguous.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let forwarder = Forwarder::from_config(&config);
        let routes = api::build_route_table(&config, &forwarder)?;
        Ok(Self::with_routes(config, routes))
    }

    /// Serve an already built route table.
    pub fn with_routes(config: GatewayConfig, routes: RouteTable) -> Self {
        let routes = Arc::new(routes);
        let state = AppState {
            routes: routes.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `stop` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, stop: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(stop))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Resolve the route and hand the request to its handler.
async fn dispatch(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(&request).unwrap_or("unknown").to_string();

    let (handler, matched, params) = match state.routes.resolve(&method, &path) {
        Ok(m) => (m.entry.handler().clone(), m.entry.to_matched(), m.params),
        Err(miss) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                miss = ?miss,
                "No route matched"
            );
            let response = miss.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), UNMATCHED_ROUTE, start);
            return response;
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %matched.template,
        permissions = %matched.permissions,
        "Route matched"
    );

    let route = matched.template.clone();
    request.extensions_mut().insert(params);
    request.extensions_mut().insert(matched);

    let response = handler.call(request).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), &route, start);
    response
}

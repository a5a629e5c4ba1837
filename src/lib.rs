//! Permission-annotated API gateway library.

pub mod api;
pub mod config;
pub mod error;
pub mod forward;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use handler::Handler;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteTable, RouteTableBuilder};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout)
//!     → server.rs dispatch (route table lookup, attach PathParams + MatchedRoute)
//!     → route handler (local resource handler or forwarding engine)
//!     → response.rs (routing misses and forwarding failures as JSON errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

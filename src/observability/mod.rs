//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (request_id, route, upstream) on every event
//! - Request ID flows from the inbound request to the upstream request
//! - Route labels use the template, never the concrete path, to bound cardinality

pub mod logging;
pub mod metrics;

//! Response forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (matched to a forwarding route)
//!     → engine.rs (rewrite URI + Host, strip hop-by-hop headers)
//!     → hyper-util client (one attempt, connect + response-head timeouts)
//!     → engine.rs (copy status and headers)
//!     → body.rs (RelayBody: Buffered coalesces, Streaming passes each chunk)
//!     → Client
//! ```
//!
//! # Design Decisions
//! - The flush policy is an enum fixed per target at registration, never per request
//! - Unreachable upstream → 502, response-head timeout → 504, no retry
//! - Client disconnect drops the relay, which drops the upstream connection

pub mod body;
pub mod engine;
pub mod target;

pub use body::RelayBody;
pub use engine::{ForwardError, ForwardHandler, Forwarder};
pub use target::{FlushPolicy, ProxyTarget, TargetError};

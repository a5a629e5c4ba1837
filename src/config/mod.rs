//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing sections)
//!     → schema.rs (upstream base URL: env override, else fixed default)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; forwarding targets never change after startup
//! - All fields have defaults to allow running without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ForwardingConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, TimeoutConfig,
    UpstreamConfig, CHAT_SERVICE_URL_ENV, CHAT_UPSTREAM,
};
pub use validation::ValidationError;

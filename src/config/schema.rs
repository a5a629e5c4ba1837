//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the chat service entry in `[upstreams]`.
pub const CHAT_UPSTREAM: &str = "chat";

/// Environment variable overriding the chat service base URL.
pub const CHAT_SERVICE_URL_ENV: &str = "LAZYRAG_CHAT_SERVICE_URL";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response relay settings.
    pub forwarding: ForwardingConfig,

    /// Upstream services, keyed by name.
    pub upstreams: BTreeMap<String, UpstreamConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let mut upstreams = BTreeMap::new();
        upstreams.insert(
            CHAT_UPSTREAM.to_string(),
            UpstreamConfig {
                base_url: "http://localhost:8046".to_string(),
                env: Some(CHAT_SERVICE_URL_ENV.to_string()),
            },
        );

        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            forwarding: ForwardingConfig::default(),
            upstreams,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Look up an upstream by name.
    pub fn upstream(&self, name: &str) -> Option<&UpstreamConfig> {
        self.upstreams.get(name)
    }

    /// Give well-known upstreams their override variable when the file names none.
    ///
    /// `env = ""` in the file switches the override off.
    pub fn apply_default_overrides(&mut self) {
        if let Some(chat) = self.upstreams.get_mut(CHAT_UPSTREAM) {
            if chat.env.is_none() {
                chat.env = Some(CHAT_SERVICE_URL_ENV.to_string());
            }
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for a handler to produce a response head, in seconds.
    pub request_secs: u64,

    /// Upstream connection establishment timeout in seconds.
    pub upstream_connect_secs: u64,

    /// Time to wait for the upstream response head in seconds.
    /// Body streaming is not bounded by this.
    pub upstream_response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 300,
            upstream_connect_secs: 5,
            upstream_response_secs: 120,
        }
    }
}

/// Response relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Bytes held by a buffered relay before it flushes.
    pub buffer_capacity: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 32 * 1024,
        }
    }
}

/// One upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Fixed default base URL, e.g. "http://localhost:8046".
    pub base_url: String,

    /// Environment variable that overrides `base_url` when set and non-empty.
    /// An empty name disables the override.
    #[serde(default)]
    pub env: Option<String>,
}

impl UpstreamConfig {
    /// Base URL after applying the environment override, without a trailing slash.
    pub fn resolve_base_url(&self) -> String {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let url = self
            .env
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(lookup)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone());
        url.trim().trim_end_matches('/').to_string()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

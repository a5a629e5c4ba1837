//! Chat routes forwarded to the chat service.

use crate::forward::{FlushPolicy, Forwarder, ProxyTarget, TargetError};
use crate::routing::{HttpMethod, RouteError, RouteTableBuilder};

use super::resources::QA_READ;

pub const CHAT_PATH: &str = "/api/chat";
pub const CHAT_STREAM_PATH: &str = "/api/chat/stream";

/// Forwarding targets for the chat service rooted at `base_url`.
///
/// Single-shot completions are buffered. Token streams are relayed chunk
/// by chunk.
pub fn targets(base_url: &str) -> Result<[(&'static str, ProxyTarget); 2], TargetError> {
    let base = base_url.trim_end_matches('/');
    Ok([
        (CHAT_PATH, ProxyTarget::new(&format!("{}{}", base, CHAT_PATH), FlushPolicy::Buffered)?),
        (
            CHAT_STREAM_PATH,
            ProxyTarget::new(&format!("{}{}", base, CHAT_STREAM_PATH), FlushPolicy::Streaming)?,
        ),
    ])
}

/// Register the chat routes.
pub fn register(
    builder: &mut RouteTableBuilder,
    forwarder: &Forwarder,
    targets: [(&'static str, ProxyTarget); 2],
) -> Result<(), RouteError> {
    for (path, target) in targets {
        tracing::info!(route = path, target = %target, policy = %target.policy(), "Chat route bound");
        builder.register(HttpMethod::Post, path, [QA_READ], forwarder.handler(target))?;
    }
    Ok(())
}

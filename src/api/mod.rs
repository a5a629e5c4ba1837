//! The gateway's route catalog.
//!
//! Every route the gateway serves is registered here, once, at startup:
//! resource routes bound to local handlers and chat routes bound to the
//! forwarding engine. The same catalog feeds the permission manifest.

pub mod chat;
pub mod resources;

use crate::config::{GatewayConfig, CHAT_UPSTREAM};
use crate::error::GatewayError;
use crate::forward::Forwarder;
use crate::routing::{RouteTable, RouteTableBuilder};

pub use resources::{DOCUMENT_READ, DOCUMENT_WRITE, QA_READ, USER_READ};

/// Build and freeze the full route table.
pub fn build_route_table(config: &GatewayConfig, forwarder: &Forwarder) -> Result<RouteTable, GatewayError> {
    let chat_base = config
        .upstream(CHAT_UPSTREAM)
        .ok_or_else(|| GatewayError::MissingUpstream(CHAT_UPSTREAM.to_string()))?
        .resolve_base_url();

    let mut builder = RouteTable::builder();
    register_all(&mut builder, forwarder, &chat_base)?;
    Ok(builder.build())
}

/// Register the whole catalog into `builder`.
pub fn register_all(
    builder: &mut RouteTableBuilder,
    forwarder: &Forwarder,
    chat_base: &str,
) -> Result<(), GatewayError> {
    resources::register(builder)?;
    chat::register(builder, forwarder, chat::targets(chat_base)?)?;
    Ok(())
}

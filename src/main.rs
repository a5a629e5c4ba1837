//! API gateway
//!
//! Serves a permission-annotated route table. Resource routes run local
//! handlers. Chat routes are forwarded to the chat service, buffered or
//! streamed per route.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  GATEWAY                     │
//!     Client Request      │  ┌─────────┐    ┌──────────────┐             │
//!     ────────────────────┼─▶│  http   │───▶│   routing    │             │
//!                         │  │ server  │    │ route table  │             │
//!                         │  └─────────┘    └──────┬───────┘             │
//!                         │                        │                     │
//!                         │            ┌───────────┴──────────┐          │
//!                         │            ▼                      ▼          │
//!                         │   ┌────────────────┐     ┌───────────────┐   │
//!                         │   │ api resources  │     │    forward    │───┼──▶ Chat
//!                         │   │ local handlers │     │ buffered or   │◀──┼─── Service
//!                         │   └────────────────┘     │ streaming     │   │
//!                         │                          └───────────────┘   │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::{load_or_default, GatewayConfig};
use api_gateway::lifecycle::{wait_for_signal, Shutdown};
use api_gateway::observability::{logging, metrics};
use api_gateway::{GatewayError, HttpServer};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Permission-annotated API gateway", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig) -> Result<(), GatewayError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_response_secs = config.timeouts.upstream_response_secs,
        buffer_capacity = config.forwarding.buffer_capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address was checked during validation.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    // Every route is registered before the listener binds.
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;
    Ok(())
}

//! Print the gateway's permission manifest.
//!
//! Builds the same route table the gateway serves and writes one
//! `{method, path, permissions}` record per protected route, sorted by
//! method then path, as pretty JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_gateway::api;
use api_gateway::config::load_or_default;
use api_gateway::forward::Forwarder;
use api_gateway::GatewayError;

#[derive(Parser)]
#[command(name = "extract-permissions")]
#[command(about = "Export the (method, path) -> permissions manifest", long_about = None)]
struct Cli {
    /// Write the manifest here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Gateway configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match extract(&cli) {
        Ok(count) => {
            if cli.output.is_some() {
                eprintln!("Wrote {} permission records", count);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn extract(cli: &Cli) -> Result<usize, GatewayError> {
    let config = load_or_default(cli.config.as_deref())?;
    let forwarder = Forwarder::from_config(&config);
    let routes = api::build_route_table(&config, &forwarder)?;

    let manifest = routes.permission_manifest();
    let json = manifest.to_json_pretty()?;

    match &cli.output {
        Some(path) => fs::write(path, format!("{}\n", json))?,
        None => println!("{}", json),
    }
    Ok(manifest.len())
}

//! Gateway binary entrypoint.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use gatekeeper::config::{load_config, GatewayConfig};
use gatekeeper::observability::logging;
use gatekeeper::{GatewayServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "gatekeeper", about = "Multi-tenant request gateway")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    if cli.config.is_none() {
        tracing::warn!("no config file given; running with defaults");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();

    let ctrlc = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            ctrlc.trigger();
        }
    });

    let server = GatewayServer::new(config);
    server
        .run(listener, shutdown.subscribe(), shutdown.subscribe())
        .await?;

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;

use config::{AppState, BridgeConfig};

#[derive(Parser, Debug)]
#[command(name = "fathom")]
#[command(about = "HTTP bridge for the Fathom tool servers", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fathom.toml")]
    config: PathBuf,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides the config file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fathom=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Fathom HTTP bridge");

    let mut config = BridgeConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let state = AppState::new(&config)?;

    let addr = config.bind_addr();
    api::serve(&addr, state).await?;

    Ok(())
}

// Standalone MCP server binary, speaking JSON-RPC over stdio

use anyhow::Result;
use fathom_core::{Credentials, Dispatcher};
use fathom_mcp::tools::build_registry;
use fathom_mcp::McpServer;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Fathom MCP server starting");

    let creds = Credentials::from_env();
    let registry = Arc::new(build_registry(&creds)?);

    let deadline = std::env::var("FATHOM_CALL_DEADLINE_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fathom_core::dispatch::DEFAULT_DEADLINE);
    let dispatcher = Arc::new(Dispatcher::with_deadline(registry, deadline));

    let server = McpServer::new(dispatcher);
    server.run_stdio().await?;

    Ok(())
}

pub mod crm;
pub mod filings;
pub mod market;
pub mod social;
pub mod terminal;

use crate::http::build_client;
use fathom_core::{Credentials, ToolRegistry};
use std::sync::Arc;

/// Build the full tool table. Every family registers unconditionally; a
/// family whose credentials are missing answers each call with an
/// unavailable error instead of disappearing from the listing.
pub fn build_registry(creds: &Arc<Credentials>) -> anyhow::Result<ToolRegistry> {
    let http = build_client()?;
    let mut registry = ToolRegistry::new();

    market::register(&mut registry, &http, creds)?;
    filings::register(&mut registry, &http, creds)?;
    social::register(&mut registry, &http, creds)?;
    crm::register(&mut registry, &http, creds)?;
    terminal::register(&mut registry, creds)?;

    tracing::info!(tools = registry.len(), "tool registry built");
    Ok(registry)
}

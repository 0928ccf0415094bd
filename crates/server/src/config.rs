use anyhow::{Context, Result};
use fathom_core::{Credentials, Dispatcher};
use fathom_mcp::tools::build_registry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-invocation deadline enforced by the dispatcher.
    #[serde(default = "default_deadline_secs")]
    pub call_deadline_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_deadline_secs() -> u64 {
    30
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            call_deadline_secs: default_deadline_secs(),
        }
    }
}

impl BridgeConfig {
    /// Load the TOML config file if present, defaults otherwise. A file that
    /// exists but does not parse is a startup failure, not a fallback.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!("configuration file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)
            .context("Failed to read configuration file")?;
        toml::from_str(&content).context("Failed to parse configuration file")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.call_deadline_secs)
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let creds = Credentials::from_env();
        let registry = Arc::new(build_registry(&creds)?);
        let dispatcher = Arc::new(Dispatcher::with_deadline(registry, config.deadline()));
        Ok(Self { dispatcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.deadline(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: BridgeConfig = toml::from_str("port = 9090").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.call_deadline_secs, 30);
    }
}

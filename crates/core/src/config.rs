//! Process-wide credential configuration.
//!
//! Read once from the environment at startup into an immutable struct and
//! passed by `Arc` into handlers. Values are never logged and never written
//! anywhere; a missing optional credential degrades that tool family to an
//! unavailable error instead of crashing the process.

use std::sync::Arc;

/// Market-data provider credentials.
#[derive(Debug, Clone)]
pub struct MarketCredentials {
    pub api_key: String,
    pub base_url: String,
}

/// EDGAR access configuration. The SEC requires a descriptive User-Agent
/// with contact information on every request.
#[derive(Debug, Clone)]
pub struct FilingsConfig {
    pub search_base_url: String,
    pub submissions_base_url: String,
    pub user_agent: String,
}

/// Reddit needs no key for the public JSON listings, only a User-Agent.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// Generic CRM REST API credentials.
#[derive(Debug, Clone)]
pub struct CrmCredentials {
    pub base_url: String,
    pub api_token: String,
}

/// Container-execution channel configuration.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub container: String,
    pub shell: String,
}

/// Everything the tool families need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub market: Option<MarketCredentials>,
    pub filings: FilingsConfig,
    pub social: SocialConfig,
    pub crm: Option<CrmCredentials>,
    pub terminal: Option<TerminalConfig>,
}

const DEFAULT_EDGAR_SEARCH_URL: &str = "https://efts.sec.gov/LATEST";
const DEFAULT_EDGAR_SUBMISSIONS_URL: &str = "https://data.sec.gov";
const DEFAULT_EDGAR_USER_AGENT: &str = "fathom-mcp/0.1 (ops@fathom.dev)";
const DEFAULT_REDDIT_URL: &str = "https://www.reddit.com";
const DEFAULT_REDDIT_USER_AGENT: &str = "fathom-mcp/0.1";
const DEFAULT_TERMINAL_SHELL: &str = "/bin/sh";

impl Credentials {
    /// Resolve from the process environment. Missing family credentials are
    /// logged as warnings here, once, and again surfaced per call as
    /// `UpstreamUnavailable`; nothing in this path is fatal.
    pub fn from_env() -> Arc<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve through an arbitrary lookup. Tests inject a map here instead
    /// of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Arc<Self> {
        let nonempty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let market = match (nonempty("FATHOM_MARKET_API_KEY"), nonempty("FATHOM_MARKET_BASE_URL")) {
            (Some(api_key), Some(base_url)) => Some(MarketCredentials { api_key, base_url }),
            (Some(_), None) | (None, Some(_)) | (None, None) => {
                tracing::warn!(
                    "market tools unavailable: set FATHOM_MARKET_API_KEY and FATHOM_MARKET_BASE_URL"
                );
                None
            }
        };

        let filings = FilingsConfig {
            search_base_url: nonempty("FATHOM_EDGAR_SEARCH_URL")
                .unwrap_or_else(|| DEFAULT_EDGAR_SEARCH_URL.to_string()),
            submissions_base_url: nonempty("FATHOM_EDGAR_SUBMISSIONS_URL")
                .unwrap_or_else(|| DEFAULT_EDGAR_SUBMISSIONS_URL.to_string()),
            user_agent: nonempty("FATHOM_EDGAR_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_EDGAR_USER_AGENT.to_string()),
        };

        let social = SocialConfig {
            base_url: nonempty("FATHOM_REDDIT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_REDDIT_URL.to_string()),
            user_agent: nonempty("FATHOM_REDDIT_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_REDDIT_USER_AGENT.to_string()),
        };

        let crm = match (nonempty("FATHOM_CRM_BASE_URL"), nonempty("FATHOM_CRM_API_TOKEN")) {
            (Some(base_url), Some(api_token)) => Some(CrmCredentials { base_url, api_token }),
            (None, None) => {
                tracing::warn!(
                    "crm tools unavailable: set FATHOM_CRM_BASE_URL and FATHOM_CRM_API_TOKEN"
                );
                None
            }
            _ => {
                tracing::warn!(
                    "crm tools unavailable: FATHOM_CRM_BASE_URL and FATHOM_CRM_API_TOKEN must both be set"
                );
                None
            }
        };

        let terminal = match nonempty("FATHOM_TERMINAL_CONTAINER") {
            Some(container) => Some(TerminalConfig {
                container,
                shell: nonempty("FATHOM_TERMINAL_SHELL")
                    .unwrap_or_else(|| DEFAULT_TERMINAL_SHELL.to_string()),
            }),
            None => {
                tracing::warn!("terminal tools unavailable: set FATHOM_TERMINAL_CONTAINER");
                None
            }
        };

        Arc::new(Self {
            market,
            filings,
            social,
            crm,
            terminal,
        })
    }
}

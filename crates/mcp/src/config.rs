// Process configuration: command line flags with environment fallbacks

use crate::protocol::ServerInfo;
use crate::tools::CatalogSource;
use bugrelay_client::{ConfigError, RelayClient};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "bugrelay-mcp")]
#[command(about = "MCP server relaying tool calls to the BugRelay API", long_about = None)]
pub struct RelayArgs {
    /// BugRelay API base URL
    #[arg(long, env = "BUGRELAY_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Static API key, sent as X-API-Key when no bearer token applies
    #[arg(long, env = "BUGRELAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Initial session bearer token
    #[arg(long, env = "DEFAULT_AUTH_TOKEN", hide_env_values = true)]
    pub default_auth_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Retry budget. Recorded only; requests are attempted once.
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Name reported in the initialize handshake
    #[arg(long, env = "MCP_SERVER_NAME", default_value = "bugrelay-mcp-server")]
    pub server_name: String,

    /// Version reported in the initialize handshake
    #[arg(long, env = "MCP_SERVER_VERSION", default_value = "1.0.0")]
    pub server_version: String,

    /// Directory holding tools.json, admin-tools.json and oauth-tools.json.
    /// The compiled-in catalogs are used when unset.
    #[arg(long, env = "BUGRELAY_CATALOG_DIR")]
    pub catalog_dir: Option<PathBuf>,
}

impl RelayArgs {
    /// Build the forwarding client. Fails on a malformed base URL or a zero timeout.
    pub fn build_client(&self) -> Result<RelayClient, ConfigError> {
        let mut builder = RelayClient::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.request_timeout))
            .max_retries(self.max_retries);

        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(token) = &self.default_auth_token {
            builder = builder.default_bearer_token(token);
        }

        builder.build()
    }

    pub fn catalog_sources(&self) -> Vec<CatalogSource> {
        match &self.catalog_dir {
            Some(dir) => CatalogSource::directory(dir),
            None => CatalogSource::embedded(),
        }
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.server_name.clone(),
            version: self.server_version.clone(),
        }
    }

    /// Translate the configured level into an `EnvFilter` directive.
    /// Accepts the upper-case names deployments commonly set (`WARNING`, `CRITICAL`).
    pub fn log_filter(&self) -> String {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            "" => "info".to_string(),
            other => other.to_string(),
        }
    }
}

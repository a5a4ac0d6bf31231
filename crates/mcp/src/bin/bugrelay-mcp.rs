// Standalone MCP server binary

use anyhow::{Context, Result};
use bugrelay_mcp::tools::{DispatchTable, ToolCatalog};
use bugrelay_mcp::{McpServer, RelayArgs};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = RelayArgs::parse();

    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!("BugRelay MCP Server starting...");
    tracing::info!(
        base_url = %args.base_url,
        timeout_secs = args.request_timeout,
        max_retries = args.max_retries,
        api_key = args.api_key.is_some(),
        session_token = args.default_auth_token.is_some(),
        "Relay configuration"
    );

    let client = args
        .build_client()
        .context("Failed to configure the BugRelay client")?;

    let catalog = ToolCatalog::load(&args.catalog_sources());
    if catalog.is_empty() {
        tracing::warn!("No tools advertised; check the catalog directory");
    }

    let dispatch = DispatchTable::new(Arc::new(client));
    let report = dispatch.check_catalog(&catalog);
    tracing::info!(
        advertised = catalog.len(),
        routable = dispatch.len(),
        consistent = report.is_consistent(),
        "Registered tools"
    );

    let server = Arc::new(McpServer::new(args.server_info(), catalog, dispatch));
    server.start().await.context("MCP session failed")?;

    Ok(())
}

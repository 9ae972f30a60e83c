//! toolshelf server entry point.
//!
//! Loads configuration, opens the catalog and serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use toolshelf_core::{AppConfig, Catalog};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let catalog = Catalog::open(&config)
        .await
        .with_context(|| format!("opening catalog at {}", config.db_path.display()))?;

    tracing::info!(
        db_path = %config.db_path.display(),
        cache_ttl_secs = config.cache_ttl_secs,
        "Starting toolshelf server on stdio transport"
    );

    let handler = handler::ToolshelfServer::new(catalog, config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

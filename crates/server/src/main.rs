//! offcache server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offcache_client::{FetchConfig, HttpFetcher};
use offcache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from_app(&config))?);
    let state = Arc::new(state::AppState::new(config, db, fetcher));

    match state.config.engine_config() {
        Ok(engine_config) => match state.registration.deploy(engine_config).await {
            Ok(outcome) => tracing::info!(version = %outcome.version, state = %outcome.state, "initial deploy"),
            Err(e) => tracing::warn!(error = %e, "initial deploy failed; requests pass through until cache_deploy"),
        },
        Err(e) => tracing::warn!(error = %e, "invalid engine configuration"),
    }

    tracing::info!(origin = %state.config.origin, "Starting offcache server on stdio transport");

    let handler = handler::OffcacheServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

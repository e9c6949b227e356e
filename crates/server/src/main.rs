//! cyft-sw server entry point.
//!
//! Loads configuration, opens the cache storage, boots the worker and serves
//! MCP on stdio transport. Logging goes to stderr to avoid interfering with
//! the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use cyft_client::{CacheController, FetchConfig, Fetcher, HttpFetcher, WorkerConfig};
use cyft_core::{AppConfig, CacheDb};

mod error;
mod handler;
#[cfg(test)]
mod testing;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version, origin = %config.origin, "Starting cyft-sw on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let controller = CacheController::new(WorkerConfig::from_app_config(&config)?, db.clone(), network.clone());

    // a worker that fails to install stays redundant; requests then pass through
    if let Err(err) = controller.boot().await {
        tracing::error!("worker boot failed: {}", err);
    }

    let handler = handler::CyftSwServer::new(controller, network);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    db.close().await?;

    Ok(())
}

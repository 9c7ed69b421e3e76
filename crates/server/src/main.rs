//! swcache host entry point.
//!
//! Loads the deployment configuration, opens the cache storage, and serves
//! the worker's trigger events as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb, CacheWorker, LocalHost};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = config.worker_config()?;
    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from_app_config(&config)?)?;

    tracing::info!(
        cache = %worker_config.cache_name,
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "Starting swcache host on stdio transport"
    );

    let worker = Arc::new(CacheWorker::new(db, fetcher, LocalHost::default(), worker_config));
    let handler = handler::SwCacheServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

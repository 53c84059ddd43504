//! swcache server entry point.
//!
//! Boots the cache manager worker and serves its lifecycle events as MCP
//! tools on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, ServiceWorker, WorkerContext};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

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
    let cache = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let ctx = WorkerContext::from_config(&config)?;
    let worker = Arc::new(ServiceWorker::new(ctx, cache, network));

    if config.install_on_start {
        start_worker(&worker).await;
    }

    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        db_path = %config.db_path.display(),
        "Starting swcache server on stdio transport"
    );

    let handler = handler::SwCacheServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

/// Install and activate at boot. Failures leave the worker uncontrolling;
/// `sw_install` retries.
async fn start_worker(worker: &ServiceWorker) {
    if let Err(e) = worker.install().await {
        tracing::warn!("install at startup failed: {e}");
        return;
    }
    if let Err(e) = worker.activate().await {
        tracing::warn!("activate at startup failed: {e}");
    }
}

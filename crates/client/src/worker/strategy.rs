//! Caching strategies and the offline fallback.
//!
//! ### Cache-first
//! - Hit: answer from the namespace and schedule a background refresh.
//! - Miss: fetch, store a copy on `200`, return whatever the network said.
//!
//! ### Network-first
//! - Fetch, store a copy on `200`, return the live response.
//! - Transport failure: answer from the namespace if possible.
//!
//! Either strategy ends in [`CacheManager::offline_fallback`] when it has
//! nothing else to return. Errors never escape: every path resolves to a
//! response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Destination, Error, Namespace, Request, Response};
use tokio::task::JoinHandle;

use super::context::WorkerContext;
use crate::fetch::Network;

/// Where a delivered response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    Fallback,
    /// Not intercepted; fetched straight from the network.
    Passthrough,
}

/// Outcome of serving one request.
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
    /// Set when a cache hit scheduled a background refresh.
    pub refresh: Option<RefreshHandle>,
}

impl Served {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source, refresh: None }
    }
}

/// A scheduled background refresh.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Wait for the refresh to complete. Refresh failures are already
    /// logged by the task itself.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            tracing::debug!("background refresh task aborted: {e}");
        }
    }
}

/// Serves requests from cache namespaces and the network.
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) ctx: Arc<WorkerContext>,
    pub(crate) cache: CacheDb,
    pub(crate) network: Arc<dyn Network>,
}

impl CacheManager {
    pub fn new(ctx: Arc<WorkerContext>, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { ctx, cache, network }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Cache-first: answer from `namespace` when possible.
    pub async fn cache_first(&self, request: &Request, namespace: &str) -> Served {
        match self.try_cache_first(request, namespace).await {
            Ok(served) => served,
            Err(e) => {
                if e.is_network() {
                    tracing::warn!(url = %request.url, namespace, "network unavailable on cache miss: {e}");
                } else {
                    tracing::error!(url = %request.url, namespace, "cache-first strategy failed: {e}");
                }
                Served::new(self.offline_fallback(request).await, ResponseSource::Fallback)
            }
        }
    }

    async fn try_cache_first(&self, request: &Request, namespace: &str) -> Result<Served, Error> {
        let cache = self.cache.open_namespace(namespace).await?;

        if let Some(entry) = cache.match_request(request).await? {
            tracing::debug!(url = %request.url, namespace, "cache hit");
            let refresh = self.schedule_background_refresh(request.clone(), cache);
            return Ok(Served { response: entry.response, source: ResponseSource::Cache, refresh: Some(refresh) });
        }

        let response = self.network.fetch(request).await?;
        store_copy(&cache, request, &response).await;
        Ok(Served::new(response, ResponseSource::Network))
    }

    /// Network-first: answer from the network, fall back to `namespace`.
    pub async fn network_first(&self, request: &Request, namespace: &str) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() && request.is_cacheable_method() {
                    match self.cache.open_namespace(namespace).await {
                        Ok(cache) => store_copy(&cache, request, &response).await,
                        Err(e) => tracing::warn!(namespace, "could not open namespace to store response: {e}"),
                    }
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, "network request failed, trying cache: {e}");
                match self.lookup(request, namespace).await {
                    Ok(Some(response)) => Served::new(response, ResponseSource::Cache),
                    Ok(None) => Served::new(self.offline_fallback(request).await, ResponseSource::Fallback),
                    Err(e) => {
                        tracing::error!(url = %request.url, namespace, "cache lookup failed: {e}");
                        Served::new(self.offline_fallback(request).await, ResponseSource::Fallback)
                    }
                }
            }
        }
    }

    async fn lookup(&self, request: &Request, namespace: &str) -> Result<Option<Response>, Error> {
        let cache = self.cache.open_namespace(namespace).await?;
        Ok(cache.match_request(request).await?.map(|entry| entry.response))
    }

    /// Response for a request that neither the network nor its namespace
    /// could answer.
    ///
    /// Documents get the cached shell page when the static namespace has
    /// one; everything else gets an empty 404.
    pub async fn offline_fallback(&self, request: &Request) -> Response {
        if request.destination == Destination::Document {
            match self.cached_shell().await {
                Ok(Some(shell)) => return shell,
                Ok(None) => tracing::warn!(url = %request.url, "offline shell not cached"),
                Err(e) => tracing::error!(url = %request.url, "offline shell lookup failed: {e}"),
            }
        }

        Response::empty(404)
    }

    async fn cached_shell(&self) -> Result<Option<Response>, Error> {
        let shell = self.ctx.shell_request()?;
        self.lookup(&shell, &self.ctx.names().static_assets).await
    }

    /// Re-fetch `request` in a detached task and store the result in
    /// `cache` when it comes back `200`.
    pub fn schedule_background_refresh(&self, request: Request, cache: Namespace) -> RefreshHandle {
        let network = Arc::clone(&self.network);
        let task = tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    if let Err(e) = cache.put(&request, &response).await {
                        tracing::debug!(url = %request.url, "background cache update failed: {e}");
                    } else {
                        tracing::debug!(url = %request.url, namespace = cache.name(), "background cache update stored");
                    }
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "background cache update skipped");
                }
                Err(e) => tracing::debug!(url = %request.url, "background cache update failed: {e}"),
            }
        });
        RefreshHandle { task }
    }
}

/// Store a copy of a `200` response; a failed write never affects the
/// response being returned.
async fn store_copy(cache: &Namespace, request: &Request, response: &Response) {
    if !response.is_cacheable() {
        return;
    }
    if !request.is_cacheable_method() {
        tracing::debug!(method = %request.method, url = %request.url, "not caching non-GET response");
        return;
    }
    if let Err(e) = cache.put(request, response).await {
        tracing::warn!(url = %request.url, namespace = cache.name(), "failed to cache response: {e}");
    }
}

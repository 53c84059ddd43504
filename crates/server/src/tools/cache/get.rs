//! cache_get tool implementation.
//!
//! Looks up the stored response for a request in one namespace.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ServiceWorker;
use swcache_core::{Error, Request};

use crate::tools::{body_text, json_result};

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Full namespace name, e.g. `static-v1.1.0`.
    pub namespace: String,

    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGetOutput {
    pub namespace: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
    /// UTF-8 body, absent for binary responses.
    pub body: Option<String>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let cache = worker.cache();
    if !cache.has_namespace(&params.namespace).await? {
        return Err(Error::CacheMiss(format!("namespace {}", params.namespace)).into());
    }

    let url = worker.context().resolve(params.url.trim())?;
    let request = Request::get(url).with_method(&params.method);
    let entry = cache
        .open_namespace(&params.namespace)
        .await?
        .match_request(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method, request.url)))?;

    let output = CacheGetOutput {
        namespace: entry.namespace,
        key_hash: entry.key_hash,
        method: entry.method,
        url: entry.url,
        stored_at: entry.stored_at,
        status: entry.response.status,
        body_bytes: entry.response.body.len(),
        body: body_text(&entry.response.body),
        headers: entry.response.headers,
    };
    json_result(&output)
}

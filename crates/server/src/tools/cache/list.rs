//! cache_list tool implementation.
//!
//! Lists namespaces, or the entries of one namespace.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ServiceWorker;
use swcache_core::Error;

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Namespace to list entries of. Omit to list the namespaces.
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryKey {
    pub method: String,
    pub url: String,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheListOutput {
    Entries { namespace: String, entries: Vec<EntryKey> },
    Namespaces { namespaces: Vec<String> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &ServiceWorker, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let cache = worker.cache();

    let output = match params.namespace {
        None => CacheListOutput::Namespaces { namespaces: cache.namespace_names().await? },
        Some(namespace) => {
            if !cache.has_namespace(&namespace).await? {
                return Err(Error::CacheMiss(format!("namespace {namespace}")).into());
            }
            let entries = cache
                .open_namespace(&namespace)
                .await?
                .keys()
                .await?
                .into_iter()
                .map(|(method, url)| EntryKey { method, url })
                .collect();
            CacheListOutput::Entries { namespace, entries }
        }
    };
    json_result(&output)
}

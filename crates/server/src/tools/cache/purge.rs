//! cache_purge tool implementation.
//!
//! Deletes a namespace and every entry in it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ServiceWorker;
use swcache_core::Error;

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Full namespace name to delete.
    pub namespace: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub namespace: String,
    /// Whether the namespace existed.
    pub deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &ServiceWorker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let namespace = params.namespace.trim().to_string();
    if namespace.is_empty() {
        return Err(Error::InvalidInput("namespace must not be empty".to_string()).into());
    }

    let deleted = worker.cache().delete_namespace(&namespace).await?;
    if deleted && worker.context().names().is_current(&namespace) {
        tracing::warn!(namespace = %namespace, "purged a namespace of the running version");
    }

    json_result(&CachePurgeOutput { namespace, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output, worker};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_purge_namespace() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        worker.install().await.unwrap();

        let params = CachePurgeParams { namespace: "images-v1.1.0".into() };
        let result = purge_impl(&worker, params).await.unwrap();
        let out: CachePurgeOutput = output(&result);
        assert!(out.deleted);
        assert_eq!(worker.cache().namespace_names().await.unwrap(), vec!["static-v1.1.0"]);
    }

    #[tokio::test]
    async fn test_purge_missing_namespace() {
        let worker = worker(Arc::new(StubNetwork::site())).await;

        let params = CachePurgeParams { namespace: "static-v0.9.0".into() };
        let result = purge_impl(&worker, params).await.unwrap();
        let out: CachePurgeOutput = output(&result);
        assert!(!out.deleted);
    }

    #[tokio::test]
    async fn test_purge_no_namespace() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        let params = CachePurgeParams { namespace: "  ".into() };
        assert!(purge_impl(&worker, params).await.is_err());
    }
}

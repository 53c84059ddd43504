//! sw_fetch tool implementation.
//!
//! Sends one request through the worker the way a controlled page would.
//! A background refresh scheduled by a cache hit keeps running after the
//! tool returns.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::worker::classify;
use swcache_client::{ResponseSource, ServiceWorker};
use swcache_core::{Destination, Request};

use crate::tools::{body_text, json_result};

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination (document, image, script, style, ...). Empty for plain fetches.
    #[serde(default)]
    pub destination: String,

    /// Extra request headers, sent when the request reaches the network.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutput {
    pub url: String,
    pub status: u16,
    pub source: ResponseSource,
    pub headers: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    /// UTF-8 body, absent for binary responses.
    pub body: Option<String>,
    pub refresh_scheduled: bool,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: FetchParams) -> Result<CallToolResult, McpError> {
    let url = worker.context().resolve(params.url.trim())?;
    let destination: Destination = params.destination.parse().unwrap_or_default();
    let request = params.headers.into_iter().fold(
        Request::get(url)
            .with_method(&params.method)
            .with_destination(destination),
        |request, (name, value)| request.with_header(name, value),
    );

    tracing::debug!(url = %request.url, kind = ?classify(&request), "sw_fetch");
    let served = worker.dispatch_fetch(&request).await?;

    let response = served.response;
    let output = FetchOutput {
        url: request.url.to_string(),
        status: response.status,
        source: served.source,
        content_type: response.content_type().map(str::to_string),
        body_bytes: response.body.len(),
        body: body_text(&response.body),
        headers: response.headers,
        refresh_scheduled: served.refresh.is_some(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, active_worker, output, worker};
    use std::sync::Arc;

    fn params(url: &str, destination: &str) -> FetchParams {
        FetchParams {
            url: url.to_string(),
            method: default_method(),
            destination: destination.to_string(),
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_params_defaults() {
        let params: FetchParams = serde_json::from_str(r#"{"url": "/guide.html"}"#).unwrap();
        assert_eq!(params.method, "GET");
        assert_eq!(params.destination, "");
        assert!(params.headers.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_forwards_headers() {
        let network = Arc::new(StubNetwork::site());
        let worker = worker(network.clone()).await;
        let mut request = params("/guide.html", "document");
        request.headers.insert("accept-language".into(), "fr".into());

        fetch_impl(&worker, request).await.unwrap();
        assert_eq!(network.last_headers(), vec![("accept-language".to_string(), "fr".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let worker = worker(Arc::new(StubNetwork::site())).await;

        let result = fetch_impl(&worker, params("/guide.html", "document")).await.unwrap();
        let out: FetchOutput = output(&result);
        assert_eq!(out.source, ResponseSource::Passthrough);
        assert_eq!(out.body.as_deref(), Some("<h1>guide</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_precached_script_from_cache() {
        let worker = active_worker(Arc::new(StubNetwork::site())).await;

        let result = fetch_impl(&worker, params("/app.js", "script")).await.unwrap();
        let out: FetchOutput = output(&result);
        assert_eq!(out.source, ResponseSource::Cache);
        assert_eq!(out.status, 200);
        assert!(out.refresh_scheduled);
        assert_eq!(out.url, "https://resurgence.example/app.js");
    }

    #[tokio::test]
    async fn test_fetch_binary_body_omitted() {
        let worker = active_worker(Arc::new(StubNetwork::site())).await;

        let result = fetch_impl(&worker, params("/logo.png", "image")).await.unwrap();
        let out: FetchOutput = output(&result);
        assert_eq!(out.content_type.as_deref(), Some("image/png"));
        assert_eq!(out.body_bytes, 4);
        assert!(out.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_gets_shell() {
        let network = Arc::new(StubNetwork::site());
        let worker = active_worker(network.clone()).await;
        network.set_offline(true);

        let result = fetch_impl(&worker, params("/guide.html", "document")).await.unwrap();
        let out: FetchOutput = output(&result);
        assert_eq!(out.source, ResponseSource::Fallback);
        assert_eq!(out.body.as_deref(), Some("<h1>shell</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        let result = fetch_impl(&worker, params("ftp://files.example/x", "")).await;
        assert!(result.is_err());
    }
}

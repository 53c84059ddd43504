//! sw_sync, sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ClientWindow, Notification, ServiceWorker, SyncOutcome};

use crate::tools::json_result;

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync tag; only the registered analytics tag does anything.
    pub tag: String,
}

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Push message text. Missing or empty payloads show nothing.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Output from the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushOutput {
    pub shown: Option<Notification>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Tag of the clicked notification. Defaults to the worker's notification tag.
    #[serde(default)]
    pub tag: Option<String>,
}

/// Output from the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationClickOutput {
    pub client: ClientWindow,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(worker: &ServiceWorker, params: SyncParams) -> Result<CallToolResult, McpError> {
    let outcome: SyncOutcome = worker.handle_sync(params.tag.trim()).await;
    json_result(&outcome)
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &ServiceWorker, params: PushParams) -> Result<CallToolResult, McpError> {
    let shown = worker.handle_push(params.payload.as_deref()).await?;
    json_result(&PushOutput { shown })
}

/// Implementation of the sw_notification_click tool.
pub async fn notification_click_impl(
    worker: &ServiceWorker, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let tag = params
        .tag
        .unwrap_or_else(|| worker.context().notification().tag.clone());
    let client = worker.handle_notification_click(&tag).await?;
    json_result(&NotificationClickOutput { client })
}

//! sw_install, sw_activate, sw_teardown and sw_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};
use swcache_client::{
    ActivateReport, ClientWindow, Clients, InstallReport, Notification, Notifier, ServiceWorker, WorkerState,
};

use crate::tools::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallOutput {
    pub state: WorkerState,
    #[serde(flatten)]
    pub report: InstallReport,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateOutput {
    pub state: WorkerState,
    #[serde(flatten)]
    pub report: ActivateReport,
}

/// Output from the sw_teardown tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeardownOutput {
    /// Current-version namespaces that existed and were deleted.
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceStatus {
    pub name: String,
    /// Whether the namespace belongs to the running version.
    pub current: bool,
    pub entries: usize,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    pub state: WorkerState,
    pub skip_waiting: bool,
    pub origin: String,
    pub version: String,
    pub namespaces: Vec<NamespaceStatus>,
    pub notifications: Vec<Notification>,
    pub clients: Vec<ClientWindow>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&InstallOutput { state: worker.state().await, report })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&ActivateOutput { state: worker.state().await, report })
}

/// Implementation of the sw_teardown tool.
pub async fn teardown_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let deleted = worker.teardown().await?;
    json_result(&TeardownOutput { deleted })
}

/// Implementation of the sw_status tool.
pub async fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let ctx = worker.context();
    let cache = worker.cache();

    let mut namespaces = Vec::new();
    for name in cache.namespace_names().await? {
        let entries = cache.open_namespace(&name).await?.keys().await?.len();
        namespaces.push(NamespaceStatus { current: ctx.names().is_current(&name), name, entries });
    }

    let output = StatusOutput {
        state: worker.state().await,
        skip_waiting: worker.skip_waiting().await,
        origin: ctx.origin().to_string(),
        version: ctx.version().to_string(),
        namespaces,
        notifications: worker.notifier().displayed().await,
        clients: worker.clients().list().await,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output, worker};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_install_then_activate() {
        let worker = worker(Arc::new(StubNetwork::site())).await;

        let result = install_impl(&worker).await.unwrap();
        let installed: InstallOutput = output(&result);
        assert_eq!(installed.state, WorkerState::Installed);
        assert_eq!(installed.report, InstallReport { static_entries: 2, image_entries: 1 });

        let result = activate_impl(&worker).await.unwrap();
        let activated: ActivateOutput = output(&result);
        assert_eq!(activated.state, WorkerState::Activated);
        assert!(activated.report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        let result = activate_impl(&worker).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_install_offline_fails() {
        let network = Arc::new(StubNetwork::site());
        network.set_offline(true);
        let worker = worker(network).await;

        assert!(install_impl(&worker).await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_teardown_deletes_current_namespaces() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        worker.install().await.unwrap();
        worker.cache().open_namespace("static-v1.0.0").await.unwrap();

        let result = teardown_impl(&worker).await.unwrap();
        let mut out: TeardownOutput = output(&result);
        out.deleted.sort();
        assert_eq!(out.deleted, vec!["images-v1.1.0", "static-v1.1.0"]);
        assert_eq!(worker.cache().namespace_names().await.unwrap(), vec!["static-v1.0.0"]);

        let again: TeardownOutput = output(&teardown_impl(&worker).await.unwrap());
        assert!(again.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_status_reports_namespaces() {
        let worker = worker(Arc::new(StubNetwork::site())).await;
        worker.install().await.unwrap();
        worker.cache().open_namespace("static-v1.0.0").await.unwrap();

        let result = status_impl(&worker).await.unwrap();
        let status: StatusOutput = output(&result);
        assert_eq!(status.state, WorkerState::Installed);
        assert_eq!(status.version, "1.1.0");

        let statics = status.namespaces.iter().find(|n| n.name == "static-v1.1.0").unwrap();
        assert!(statics.current);
        assert_eq!(statics.entries, 2);
        let old = status.namespaces.iter().find(|n| n.name == "static-v1.0.0").unwrap();
        assert!(!old.current);
        assert_eq!(old.entries, 0);
    }
}

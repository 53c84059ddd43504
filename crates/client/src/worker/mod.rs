//! The cache manager worker.
//!
//! [`ServiceWorker`] receives the lifecycle events a host delivers
//! (install, activate, fetch, sync, push, notification click) and answers
//! them using its [`CacheManager`] and injected capabilities.
//!
//! Fetch handling:
//! - cross-origin requests, and every request before activation, pass
//!   through untouched;
//! - same-origin requests are classified and routed through the strategy
//!   table in [`routing`];
//! - intercepted requests always resolve to a response.

pub mod context;
pub mod lifecycle;
pub mod notify;
pub mod routing;
pub mod strategy;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error, Request};
use tokio::sync::RwLock;

use crate::fetch::{Network, same_origin};

pub use context::{CacheNames, NamespaceKind, WorkerContext};
pub use lifecycle::{InstallReport, WorkerState};
pub use notify::{ClientRegistry, ClientWindow, Clients, Notification, NotificationCenter, Notifier};
pub use routing::{ResourceKind, Route, Strategy, classify, route_for};
pub use strategy::{CacheManager, RefreshHandle, ResponseSource, Served};
pub use sync::{AnalyticsEvent, EventQueue, EventSink, EventSource, SyncOutcome, TracingSink, sync_analytics};

/// What the worker does with an intercepted request.
#[derive(Debug)]
pub enum FetchDecision {
    /// Not handled; the host fetches it from the network unmodified.
    Passthrough,
    Respond(Served),
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub claimed: usize,
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
}

/// One worker version and its capabilities.
pub struct ServiceWorker {
    manager: CacheManager,
    lifecycle: RwLock<Lifecycle>,
    events: Arc<dyn EventSource>,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
    clients: Arc<dyn Clients>,
}

impl ServiceWorker {
    /// Create a worker with in-process analytics, notification and client
    /// capabilities.
    pub fn new(ctx: WorkerContext, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self {
            manager: CacheManager::new(Arc::new(ctx), cache, network),
            lifecycle: RwLock::new(Lifecycle::default()),
            events: Arc::new(EventQueue::default()),
            sink: Arc::new(TracingSink),
            notifier: Arc::new(NotificationCenter::default()),
            clients: Arc::new(ClientRegistry::default()),
        }
    }

    pub fn with_analytics(mut self, events: Arc<dyn EventSource>, sink: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self.sink = sink;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = clients;
        self
    }

    pub fn context(&self) -> &WorkerContext {
        self.manager.context()
    }

    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }

    pub fn cache(&self) -> &CacheDb {
        self.manager.cache()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn clients(&self) -> &Arc<dyn Clients> {
        &self.clients
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    /// Whether the worker asked to replace the previous one without waiting.
    pub async fn skip_waiting(&self) -> bool {
        self.lifecycle.read().await.skip_waiting
    }

    async fn set_state(&self, state: WorkerState) {
        let mut lifecycle = self.lifecycle.write().await;
        tracing::debug!(from = ?lifecycle.state, to = ?state, "worker state change");
        lifecycle.state = state;
    }

    /// Handle the install event.
    ///
    /// On failure the worker becomes redundant; installing again retries.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if !lifecycle.state.can_install() {
                return Err(Error::InvalidState(format!("cannot install while {:?}", lifecycle.state)));
            }
            lifecycle.state = WorkerState::Installing;
        }

        match self.manager.install().await {
            Ok(report) => {
                let mut lifecycle = self.lifecycle.write().await;
                lifecycle.state = WorkerState::Installed;
                lifecycle.skip_waiting = true;
                tracing::info!(
                    version = self.context().version(),
                    static_entries = report.static_entries,
                    image_entries = report.image_entries,
                    "worker installed"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!(version = self.context().version(), "install failed: {e}");
                self.set_state(WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    /// Handle the activate event: rotate namespaces, then claim clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if lifecycle.state != WorkerState::Installed {
                return Err(Error::InvalidState(format!("cannot activate while {:?}", lifecycle.state)));
            }
            lifecycle.state = WorkerState::Activating;
        }

        let deleted = match self.manager.activate().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!("activate failed: {e}");
                self.set_state(WorkerState::Installed).await;
                return Err(e);
            }
        };

        let claimed = match self.clients.claim().await {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::warn!("failed to claim clients: {e}");
                0
            }
        };

        self.set_state(WorkerState::Activated).await;
        tracing::info!(version = self.context().version(), deleted = deleted.len(), claimed, "worker activated");

        Ok(ActivateReport { deleted, claimed })
    }

    /// Delete this version's namespaces.
    pub async fn teardown(&self) -> Result<Vec<String>, Error> {
        self.manager.teardown().await
    }

    /// Decide how to answer a request.
    pub async fn handle_fetch(&self, request: &Request) -> FetchDecision {
        if !same_origin(&request.url, self.context().origin()) {
            return FetchDecision::Passthrough;
        }
        if self.state().await != WorkerState::Activated {
            return FetchDecision::Passthrough;
        }

        let kind = classify(request);
        let route = route_for(kind);
        let namespace = self.context().names().get(route.namespace);
        tracing::debug!(url = %request.url, ?kind, strategy = ?route.strategy, namespace, "intercepted");

        let served = match route.strategy {
            Strategy::CacheFirst => self.manager.cache_first(request, namespace).await,
            Strategy::NetworkFirst => self.manager.network_first(request, namespace).await,
        };
        FetchDecision::Respond(served)
    }

    /// Answer a request the way a host would: intercepted requests come from
    /// the worker, passthrough requests go straight to the network.
    pub async fn dispatch_fetch(&self, request: &Request) -> Result<Served, Error> {
        match self.handle_fetch(request).await {
            FetchDecision::Respond(served) => Ok(served),
            FetchDecision::Passthrough => {
                let response = self.manager.network().fetch(request).await?;
                Ok(Served { response, source: ResponseSource::Passthrough, refresh: None })
            }
        }
    }

    /// Handle a background sync event.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag != self.context().sync_tag() {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return SyncOutcome::UnknownTag { tag: tag.to_string() };
        }
        sync_analytics(self.events.as_ref(), self.sink.as_ref()).await
    }

    /// Handle a push event. Empty payloads show nothing.
    pub async fn handle_push(&self, payload: Option<&str>) -> Result<Option<Notification>, Error> {
        let Some(text) = payload.filter(|p| !p.is_empty()) else {
            tracing::debug!("push without payload ignored");
            return Ok(None);
        };

        let notification = Notification::from_push(self.context().notification(), text);
        self.notifier.show(notification.clone()).await?;
        Ok(Some(notification))
    }

    /// Handle a notification click: close it and bring the site root up.
    pub async fn handle_notification_click(&self, tag: &str) -> Result<ClientWindow, Error> {
        if self.notifier.close(tag).await?.is_none() {
            tracing::debug!(tag, "clicked notification was no longer displayed");
        }
        self.clients.focus_or_open(&self.context().root_url()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{FakeNetwork, html, png};
    use swcache_core::{Destination, Response};
    use url::Url;

    const ORIGIN: &str = "https://resurgence.example";

    fn context() -> WorkerContext {
        WorkerContext::new(ORIGIN, "1.1.0")
            .unwrap()
            .with_manifest(&["/index.html", "/styles/main.css"], &["/logo.png"])
    }

    fn serve_manifest(network: &FakeNetwork) {
        network.serve(&format!("{ORIGIN}/index.html"), html("shell"));
        network.serve(&format!("{ORIGIN}/styles/main.css"), Response::new(200, vec![], b"css".to_vec()));
        network.serve(&format!("{ORIGIN}/logo.png"), png(b"logo"));
    }

    async fn worker(network: Arc<FakeNetwork>) -> ServiceWorker {
        ServiceWorker::new(context(), CacheDb::open_in_memory().await.unwrap(), network)
    }

    async fn active_worker(network: Arc<FakeNetwork>) -> ServiceWorker {
        serve_manifest(&network);
        let worker = worker(network).await;
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    fn request(url: &str, destination: Destination) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(url).unwrap()).with_destination(destination)
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        let worker = worker(network).await;
        assert_eq!(worker.state().await, WorkerState::Parsed);

        worker.install().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.skip_waiting().await);

        worker.activate().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Activated);

        assert!(matches!(worker.install().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let worker = worker(FakeNetwork::new()).await;
        assert!(matches!(worker.activate().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant_and_retryable() {
        let network = FakeNetwork::new();
        let worker = worker(network.clone()).await;

        assert!(worker.install().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);

        serve_manifest(&network);
        worker.install().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activate_claims_clients() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        let clients = Arc::new(ClientRegistry::default());
        clients.connect(&Url::parse(ORIGIN).unwrap()).await;
        let worker = worker(network).await.with_clients(clients.clone());

        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();
        assert_eq!(report.claimed, 1);
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_activate_deletes_old_version() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        let worker = worker(network).await;
        worker.cache().open_namespace("static-v1.0.0").await.unwrap();

        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["static-v1.0.0".to_string()]);
        assert!(!worker.cache().has_namespace("static-v1.0.0").await.unwrap());
        for name in ["static-v1.1.0", "images-v1.1.0"] {
            assert!(worker.cache().has_namespace(name).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let worker = worker(FakeNetwork::new()).await;
        let decision = worker.handle_fetch(&request("/index.html", Destination::Document)).await;
        assert!(matches!(decision, FetchDecision::Passthrough));
    }

    #[tokio::test]
    async fn test_cross_origin_passthrough() {
        let network = FakeNetwork::new();
        network.serve("https://fonts.example.com/font.woff2", Response::new(200, vec![], b"font".to_vec()));
        let worker = active_worker(network.clone()).await;
        let req = Request::get(Url::parse("https://fonts.example.com/font.woff2").unwrap())
            .with_destination(Destination::Font);

        assert!(matches!(worker.handle_fetch(&req).await, FetchDecision::Passthrough));

        let served = worker.dispatch_fetch(&req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
        assert_eq!(served.response.body, b"font".to_vec());

        for name in worker.context().names().all() {
            let ns = worker.cache().open_namespace(name).await.unwrap();
            assert!(ns.match_request(&req).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_cross_origin_network_error_surfaces() {
        let network = FakeNetwork::new();
        let worker = active_worker(network.clone()).await;
        network.set_offline(true);
        let req = Request::get(Url::parse("https://cdn.example.com/lib.js").unwrap());

        assert!(worker.dispatch_fetch(&req).await.is_err());
    }

    #[tokio::test]
    async fn test_image_served_from_image_namespace() {
        let network = FakeNetwork::new();
        let worker = active_worker(network.clone()).await;
        network.hold();

        let served = worker.dispatch_fetch(&request("/logo.png", Destination::Image)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, b"logo".to_vec());
        assert_eq!(served.response.content_type(), Some("image/png"));

        network.release();
        served.refresh.unwrap().finished().await;
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_shell() {
        let network = FakeNetwork::new();
        let worker = active_worker(network.clone()).await;
        network.set_offline(true);

        let served = worker
            .dispatch_fetch(&request("/page.html", Destination::Document))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Fallback);
        assert_eq!(served.response.body, b"shell".to_vec());
    }

    #[tokio::test]
    async fn test_online_navigation_lands_in_dynamic() {
        let network = FakeNetwork::new();
        network.serve(&format!("{ORIGIN}/guide.html"), html("guide"));
        let worker = active_worker(network.clone()).await;
        let req = request("/guide.html", Destination::Document);

        let served = worker.dispatch_fetch(&req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        let dynamic = worker.cache().open_namespace("dynamic-v1.1.0").await.unwrap();
        assert!(dynamic.match_request(&req).await.unwrap().is_some());
        let statics = worker.cache().open_namespace("static-v1.1.0").await.unwrap();
        assert!(statics.match_request(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let queue = Arc::new(EventQueue::default());
        queue.record(AnalyticsEvent::new("page_view", serde_json::json!({"path": "/"}))).await;
        let worker = worker(FakeNetwork::new())
            .await
            .with_analytics(queue.clone(), Arc::new(TracingSink));

        assert_eq!(
            worker.handle_sync("form-sync").await,
            SyncOutcome::UnknownTag { tag: "form-sync".into() }
        );
        assert_eq!(queue.len().await, 1);

        assert_eq!(worker.handle_sync("analytics-sync").await, SyncOutcome::Sent { count: 1 });
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_push_and_click() {
        let worker = worker(FakeNetwork::new()).await;

        assert!(worker.handle_push(None).await.unwrap().is_none());
        assert!(worker.handle_push(Some("")).await.unwrap().is_none());

        worker.handle_push(Some("first")).await.unwrap();
        let shown = worker.handle_push(Some("second")).await.unwrap().unwrap();
        assert_eq!(shown.tag, "resurgence-notification");
        assert_eq!(worker.notifier().displayed().await, vec![shown]);

        let window = worker.handle_notification_click("resurgence-notification").await.unwrap();
        assert_eq!(window.url, "https://resurgence.example/");
        assert!(window.focused);
        assert!(worker.notifier().displayed().await.is_empty());
    }
}

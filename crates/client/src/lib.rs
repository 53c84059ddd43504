//! Client side of swcache.
//!
//! This crate provides the network capability and the cache manager worker
//! that decides, per request, whether to answer from a cache namespace or
//! from the network.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network};

pub use worker::{
    ActivateReport, AnalyticsEvent, CacheManager, CacheNames, ClientRegistry, ClientWindow, Clients, EventQueue,
    EventSink, EventSource, FetchDecision, InstallReport, Notification, NotificationCenter, Notifier, ResponseSource,
    Served, ServiceWorker, SyncOutcome, TracingSink, WorkerContext, WorkerState,
};

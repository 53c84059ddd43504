//! Push notifications and the clients they open.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, NotificationConfig};
use tokio::sync::RwLock;
use url::Url;

/// A displayed system notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
}

impl Notification {
    /// Build the notification for a push payload.
    pub fn from_push(config: &NotificationConfig, payload: &str) -> Self {
        Self {
            title: config.title.clone(),
            body: payload.to_string(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            tag: config.tag.clone(),
        }
    }
}

/// Displays and closes notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a notification, replacing any displayed one with the same tag.
    async fn show(&self, notification: Notification) -> Result<(), Error>;

    /// Close the notification with `tag`, returning it if it was displayed.
    async fn close(&self, tag: &str) -> Result<Option<Notification>, Error>;

    async fn displayed(&self) -> Vec<Notification>;
}

/// In-process notification tray keyed by tag.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: RwLock<BTreeMap<String, Notification>>,
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn show(&self, notification: Notification) -> Result<(), Error> {
        tracing::info!(tag = %notification.tag, title = %notification.title, "showing notification");
        self.shown.write().await.insert(notification.tag.clone(), notification);
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<Option<Notification>, Error> {
        Ok(self.shown.write().await.remove(tag))
    }

    async fn displayed(&self) -> Vec<Notification> {
        self.shown.read().await.values().cloned().collect()
    }
}

/// A page (window) the worker may control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientWindow {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    pub controlled: bool,
}

/// Access to the pages within the worker's scope.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Take control of every open client. Returns how many were claimed.
    async fn claim(&self) -> Result<usize, Error>;

    /// Focus a client showing `url`, or open a new one.
    async fn focus_or_open(&self, url: &Url) -> Result<ClientWindow, Error>;

    async fn list(&self) -> Vec<ClientWindow>;
}

/// In-process client registry.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    windows: RwLock<Vec<ClientWindow>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    /// Register a page that was opened outside the worker (uncontrolled).
    pub async fn connect(&self, url: &Url) -> ClientWindow {
        let window = ClientWindow {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            url: url.to_string(),
            focused: false,
            controlled: false,
        };
        self.windows.write().await.push(window.clone());
        window
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn claim(&self) -> Result<usize, Error> {
        let mut windows = self.windows.write().await;
        let mut claimed = 0;
        for window in windows.iter_mut().filter(|w| !w.controlled) {
            window.controlled = true;
            claimed += 1;
        }
        Ok(claimed)
    }

    async fn focus_or_open(&self, url: &Url) -> Result<ClientWindow, Error> {
        let mut windows = self.windows.write().await;
        for window in windows.iter_mut() {
            window.focused = false;
        }

        if let Some(window) = windows.iter_mut().find(|w| w.url == url.as_str()) {
            window.focused = true;
            return Ok(window.clone());
        }

        let window = ClientWindow {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            url: url.to_string(),
            focused: true,
            controlled: true,
        };
        tracing::info!(id = window.id, url = %window.url, "opening client window");
        windows.push(window.clone());
        Ok(window)
    }

    async fn list(&self) -> Vec<ClientWindow> {
        self.windows.read().await.clone()
    }
}

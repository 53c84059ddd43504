//! Background sync of queued analytics events.
//!
//! The worker only knows the three capabilities below; where events are
//! queued and where they are sent is up to the embedder.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;
use tokio::sync::Mutex;

/// One analytics event waiting to be transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub recorded_at: String,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { name: name.into(), payload, recorded_at: chrono::Utc::now().to_rfc3339() }
    }
}

/// Where pending events are read from and cleared.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn pending(&self) -> Result<Vec<AnalyticsEvent>, Error>;

    async fn clear(&self) -> Result<(), Error>;
}

/// Where events are transmitted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, events: &[AnalyticsEvent]) -> Result<(), Error>;
}

/// In-memory event queue.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl EventQueue {
    pub async fn record(&self, event: AnalyticsEvent) {
        self.events.lock().await.push(event);
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl EventSource for EventQueue {
    async fn pending(&self) -> Result<Vec<AnalyticsEvent>, Error> {
        Ok(self.events.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.events.lock().await.clear();
        Ok(())
    }
}

/// Sink that only logs what it would send.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn send(&self, events: &[AnalyticsEvent]) -> Result<(), Error> {
        for event in events {
            tracing::info!(name = %event.name, recorded_at = %event.recorded_at, "sending analytics event");
        }
        Ok(())
    }
}

/// Result of handling a sync event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The tag is not one this worker registered.
    UnknownTag { tag: String },
    NothingPending,
    Sent { count: usize },
    Failed { reason: String },
}

/// Send every pending event and clear the queue once they are sent.
///
/// Failures are logged and reported, never propagated.
pub async fn sync_analytics(source: &dyn EventSource, sink: &dyn EventSink) -> SyncOutcome {
    match drain(source, sink).await {
        Ok(0) => SyncOutcome::NothingPending,
        Ok(count) => SyncOutcome::Sent { count },
        Err(e) => {
            tracing::error!("analytics sync failed: {e}");
            SyncOutcome::Failed { reason: e.to_string() }
        }
    }
}

async fn drain(source: &dyn EventSource, sink: &dyn EventSink) -> Result<usize, Error> {
    let events = source.pending().await?;
    if events.is_empty() {
        return Ok(0);
    }
    sink.send(&events).await?;
    source.clear().await?;
    Ok(events.len())
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

/// A typed event flowing from the Hub (and, later, the Drift Engine) to
/// observers. `job_id` is absent for events not tied to a discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub job_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, job_id: Option<String>, data: Value, now: DateTime<Utc>) -> Self {
        Self {
            event_type: event_type.into(),
            job_id,
            timestamp: now,
            data,
        }
    }
}

/// Subscription filter: an empty `types` matches every type; `source_prefix`
/// matches against the event's `job_id` when present.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub types: Vec<String>,
    pub source_prefix: Option<String>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_types(types: Vec<String>) -> Self {
        Self {
            types,
            source_prefix: None,
        }
    }

    fn matches(&self, event: &Event) -> bool {
        if !self.types.is_empty() && !self.types.iter().any(|t| t == &event.event_type) {
            return false;
        }
        if let Some(prefix) = &self.source_prefix {
            if !event.job_id.as_deref().unwrap_or("").starts_with(prefix.as_str()) {
                return false;
            }
        }
        true
    }
}

struct Subscriber {
    id: u64,
    filter: EventFilter,
    sender: mpsc::Sender<Event>,
}

/// A live subscription: drop it or call [`EventBus::unsubscribe`] to stop
/// receiving and free the slot.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<Event>,
}

/// In-process typed publish/subscribe. Publishing never blocks: a full
/// subscriber buffer drops that subscriber's event and bumps a counter.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn subscribe(&self, filter: EventFilter, buffer: usize) -> Subscription {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().await.push(Subscriber { id, filter, sender });
        Subscription { id, receiver }
    }

    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.retain(|s| s.id != id);
    }

    /// Delivers to every matching subscriber. Never awaits on a subscriber's
    /// buffer: a full channel is a drop, not a backpressure signal.
    pub async fn publish(&self, event: Event) {
        let guard = self.subscribers.read().await;
        for sub in guard.iter() {
            if sub.filter.matches(&event) && sub.sender.try_send(event.clone()).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

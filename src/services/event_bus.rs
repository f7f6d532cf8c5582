//! EventBus service for activity streaming and agent notifications.
//!
//! Provides a broadcast-based event system with sequence numbering and
//! optional persistence of activity events. It is also the default
//! `Notifier`: notifications are broadcast to subscribers and logged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::models::ActivityEvent;
use crate::domain::ports::{ActivityRepository, Notification, Notifier};

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusPayload {
    Activity(ActivityEvent),
    Notification {
        agent_id: String,
        notification: Notification,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub sequence: SequenceNumber,
    pub payload: BusPayload,
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
    /// Whether to persist activity events to storage.
    pub persist_events: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            persist_events: true,
        }
    }
}

/// Central event bus for broadcasting events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
    sequence: AtomicU64,
    store: Option<Arc<dyn ActivityRepository>>,
    config: EventBusConfig,
}

impl EventBus {
    /// Create a new EventBus with the given configuration.
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            sender,
            sequence: AtomicU64::new(0),
            store: None,
            config,
        }
    }

    /// Add an activity store for persistence.
    pub fn with_store(mut self, store: Arc<dyn ActivityRepository>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist (if configured) and broadcast an activity event.
    ///
    /// A failing store is logged, never propagated: the mutation that
    /// produced the event has already been committed.
    pub async fn publish_activity(&self, event: ActivityEvent) {
        if self.config.persist_events {
            if let Some(ref store) = self.store {
                if let Err(e) = store.append(&event).await {
                    tracing::warn!(kind = %event.kind, "Failed to persist activity event: {}", e);
                }
            }
        }

        self.broadcast(BusPayload::Activity(event));
    }

    fn broadcast(&self, payload: BusPayload) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        // Send errors only mean nobody is subscribed.
        let _ = self.sender.send(BusEvent {
            sequence: SequenceNumber(seq),
            payload,
        });
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the activity store if configured.
    pub fn store(&self) -> Option<Arc<dyn ActivityRepository>> {
        self.store.clone()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[async_trait]
impl Notifier for EventBus {
    async fn notify(&self, agent_id: &str, notification: Notification) {
        tracing::info!(
            agent_id = %agent_id,
            task_id = %notification.task_id(),
            kind = notification.kind(),
            "notify agent"
        );
        self.broadcast(BusPayload::Notification {
            agent_id: agent_id.to_string(),
            notification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteActivityRepository};
    use crate::domain::models::ActivityKind;
    use crate::domain::ports::ActivityFilter;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::default();
        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();

        bus.publish_activity(ActivityEvent::new(ActivityKind::TaskCreated, "one")).await;
        let event1 = rx.recv().await.unwrap();
        assert_eq!(event1.sequence.0, 0);

        let task_id = Uuid::new_v4();
        bus.notify("forge", Notification::TaskAssigned { task_id }).await;
        let event2 = rx.recv().await.unwrap();
        assert_eq!(event2.sequence.0, 1);
        assert_eq!(
            event2.payload,
            BusPayload::Notification {
                agent_id: "forge".into(),
                notification: Notification::TaskAssigned { task_id },
            }
        );

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish_activity(ActivityEvent::new(ActivityKind::TaskUpdated, "nobody listening"))
            .await;
        assert_eq!(bus.current_sequence().0, 1);
    }

    #[tokio::test]
    async fn test_activity_is_persisted() {
        let pool = create_migrated_test_pool().await.unwrap();
        let store = Arc::new(SqliteActivityRepository::new(pool));
        let bus = EventBus::default().with_store(store.clone());

        bus.publish_activity(ActivityEvent::new(ActivityKind::AgentRegistered, "hello").for_agent("forge"))
            .await;
        // notifications are not activity
        bus.notify("forge", Notification::TaskUnblocked { task_id: Uuid::new_v4() }).await;

        let feed = store.recent(ActivityFilter::default()).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, ActivityKind::AgentRegistered);
    }
}

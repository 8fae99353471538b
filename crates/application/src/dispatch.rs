//! Post-commit delivery of domain events.
//!
//! Handlers drain an aggregate's pending events only after the unit of work
//! has committed, wrap them in [`PublishedEvent`] and hand them to a
//! [`DomainEventDispatcher`]. Delivery is best-effort: a failing subscriber
//! is logged and never undoes the committed command.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{AggregateRoot, DomainEvent};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CollaboratorError;

/// A committed domain event with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedEvent {
    pub aggregate_type: &'static str,
    pub aggregate_id: Uuid,
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl PublishedEvent {
    /// Wraps one event raised by aggregate `id`.
    pub fn from_domain<A: AggregateRoot>(id: A::Id, event: &A::Event) -> serde_json::Result<Self> {
        Ok(Self {
            aggregate_type: A::aggregate_type(),
            aggregate_id: id.into(),
            event_type: event.event_type(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)?,
        })
    }
}

/// Receives committed events.
#[async_trait]
pub trait DomainEventDispatcher: Send + Sync {
    async fn dispatch(&self, events: Vec<PublishedEvent>);
}

/// A subscriber registered on the [`EventBus`].
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Returns the unique name of this handler.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &PublishedEvent) -> Result<(), CollaboratorError>;
}

/// Fans every event out to all registered handlers, in registration order.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Arc<dyn DomainEventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler with this bus.
    pub fn register(&mut self, handler: Arc<dyn DomainEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait]
impl DomainEventDispatcher for EventBus {
    async fn dispatch(&self, events: Vec<PublishedEvent>) {
        for event in &events {
            tracing::debug!(
                event_type = event.event_type,
                aggregate_id = %event.aggregate_id,
                "dispatching domain event"
            );
            metrics::counter!("domain_events_dispatched_total", "event_type" => event.event_type)
                .increment(1);

            for handler in &self.handlers {
                if let Err(e) = handler.handle(event).await {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = event.event_type,
                        error = %e,
                        "domain event handler failed"
                    );
                }
            }
        }
    }
}

/// Keeps every event it sees. Useful as an audit trail and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<PublishedEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<PublishedEvent> {
        self.events.read().await.clone()
    }

    /// Returns the event types seen so far, in order.
    pub async fn event_types(&self) -> Vec<&'static str> {
        self.events.read().await.iter().map(|e| e.event_type).collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl DomainEventHandler for InMemoryEventLog {
    fn name(&self) -> &'static str {
        "InMemoryEventLog"
    }

    async fn handle(&self, event: &PublishedEvent) -> Result<(), CollaboratorError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

/// Drains `aggregate`'s pending events and dispatches them.
pub(crate) async fn publish_pending<A: AggregateRoot>(
    dispatcher: &dyn DomainEventDispatcher,
    aggregate: &mut A,
) {
    let id = aggregate.id();
    let events: Vec<PublishedEvent> = aggregate
        .take_events()
        .iter()
        .filter_map(|event| match PublishedEvent::from_domain::<A>(id, event) {
            Ok(published) => Some(published),
            Err(e) => {
                tracing::error!(
                    aggregate_type = A::aggregate_type(),
                    event_type = event.event_type(),
                    error = %e,
                    "failed to serialize domain event"
                );
                None
            }
        })
        .collect();

    if !events.is_empty() {
        dispatcher.dispatch(events).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EventId;
    use domain::EventAnalytics;

    struct FailingHandler;

    #[async_trait]
    impl DomainEventHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "FailingHandler"
        }

        async fn handle(&self, _event: &PublishedEvent) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::new("projection", "boom"))
        }
    }

    fn analytics_with_view() -> EventAnalytics {
        let mut analytics = EventAnalytics::create(EventId::new(), Utc::now()).unwrap();
        analytics.record_view(None, "127.0.0.1", Utc::now()).unwrap();
        analytics
    }

    #[tokio::test]
    async fn test_publish_drains_events() {
        let log = InMemoryEventLog::new();
        let mut bus = EventBus::new();
        bus.register(Arc::new(log.clone()));

        let mut analytics = analytics_with_view();
        publish_pending(&bus, &mut analytics).await;

        assert!(analytics.pending_events().is_empty());
        assert_eq!(log.event_types().await, vec!["EventViewRecorded"]);
        let event = &log.events().await[0];
        assert_eq!(event.aggregate_type, "EventAnalytics");
        assert_eq!(event.aggregate_id, Uuid::from(analytics.id()));
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others() {
        let log = InMemoryEventLog::new();
        let mut bus = EventBus::new();
        bus.register(Arc::new(FailingHandler));
        bus.register(Arc::new(log.clone()));
        assert_eq!(bus.handler_count(), 2);

        publish_pending(&bus, &mut analytics_with_view()).await;
        assert_eq!(log.events().await.len(), 1);
    }
}

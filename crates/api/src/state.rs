//! Shared application state and its default wiring.

use std::sync::Arc;

use application::services::{
    InMemoryBlobStorage, InMemoryEmailService, InMemoryRecipientDirectory,
};
use application::{
    BadgeHandlers, BusinessHandlers, Clock, CollaboratorError, DomainEventHandler, EventBus,
    EventHandlers, HandlerContext, HandlerSettings, NewsletterHandlers, PublishedEvent,
};
use async_trait::async_trait;
use persistence::{DocumentStore, ViewRecordStore};

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub newsletters: NewsletterHandlers<S>,
    pub events: EventHandlers<S>,
    pub businesses: BusinessHandlers<S>,
    pub badges: BadgeHandlers<S>,
}

/// The in-memory collaborators behind the default state.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub blobs: InMemoryBlobStorage,
    pub email: InMemoryEmailService,
    pub recipients: InMemoryRecipientDirectory,
}

/// Logs every committed domain event.
pub struct TracingEventHandler;

#[async_trait]
impl DomainEventHandler for TracingEventHandler {
    fn name(&self) -> &'static str {
        "TracingEventHandler"
    }

    async fn handle(&self, event: &PublishedEvent) -> Result<(), CollaboratorError> {
        tracing::info!(
            event_type = event.event_type,
            aggregate_type = event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            occurred_at = %event.occurred_at,
            "domain event"
        );
        Ok(())
    }
}

/// Creates the application state over `store` with in-memory collaborators.
///
/// `subscribers` are registered on the event bus after the tracing handler.
pub fn create_default_state<S>(
    store: S,
    clock: Arc<dyn Clock>,
    settings: HandlerSettings,
    subscribers: Vec<Arc<dyn DomainEventHandler>>,
) -> (Arc<AppState<S>>, Collaborators)
where
    S: DocumentStore + ViewRecordStore,
{
    let mut bus = EventBus::new();
    bus.register(Arc::new(TracingEventHandler));
    for subscriber in subscribers {
        bus.register(subscriber);
    }
    let ctx = HandlerContext::new(store.clone(), clock, Arc::new(bus)).with_settings(settings);

    let collaborators = Collaborators::default();
    let blobs = Arc::new(collaborators.blobs.clone());
    let state = Arc::new(AppState {
        newsletters: NewsletterHandlers::new(
            ctx.clone(),
            Arc::new(collaborators.email.clone()),
            Arc::new(collaborators.recipients.clone()),
        ),
        events: EventHandlers::new(ctx.clone(), blobs.clone(), Arc::new(store)),
        businesses: BusinessHandlers::new(ctx.clone(), blobs.clone()),
        badges: BadgeHandlers::new(ctx, blobs),
    });
    (state, collaborators)
}

//! Core entity, aggregate root and domain event abstractions.

use chrono::{DateTime, Utc};
use common::Version;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Trait for domain events.
///
/// Domain events record side-effect-worthy state changes. They are named in
/// past tense and are immutable once recorded.
pub trait DomainEvent: Serialize + Clone + Send + Sync + std::fmt::Debug {
    /// Returns the event type name used for routing and logging.
    fn event_type(&self) -> &'static str;

    /// Returns when the change happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Ordered outbox of events recorded by an aggregate.
///
/// The list is never persisted with the aggregate. The application layer
/// takes it after a successful commit and dispatches each event once.
#[derive(Debug, Clone)]
pub struct DomainEvents<E> {
    pending: Vec<E>,
}

impl<E> Default for DomainEvents<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> DomainEvents<E> {
    /// Appends an event.
    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Returns the pending events in recording order.
    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the pending events and leaves the outbox empty.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Bookkeeping shared by every entity: timestamps and the concurrency
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    version: Version,
}

impl EntityMeta {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: None,
            version: Version::initial(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn mark_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

/// Trait for aggregate roots.
///
/// An aggregate root is the only entry point for mutating one consistency
/// boundary. Its state changes exclusively through named methods that
/// return an [`Outcome`](common::Outcome) and leave the state untouched on
/// failure.
pub trait AggregateRoot: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The typed identifier of this aggregate.
    type Id: Copy + Into<Uuid> + std::fmt::Display + std::fmt::Debug + Send + Sync;

    /// The events this aggregate records.
    type Event: DomainEvent;

    /// Returns the aggregate type name, used as the storage collection.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier.
    fn id(&self) -> Self::Id;

    /// Returns the stored version the aggregate was loaded at.
    ///
    /// `Version::initial()` means the aggregate has never been committed.
    fn version(&self) -> Version;

    /// Sets the version. Called by repositories after loading.
    fn set_version(&mut self, version: Version);

    /// Returns the events recorded since the last take.
    fn pending_events(&self) -> &[Self::Event];

    /// Returns and clears the recorded events.
    fn take_events(&mut self) -> Vec<Self::Event>;
}

/// Implements [`AggregateRoot`] for a struct with `id`, `meta` and `events`
/// fields.
macro_rules! impl_aggregate_root {
    ($aggregate:ty, $id:ty, $event:ty, $name:literal) => {
        impl $crate::entity::AggregateRoot for $aggregate {
            type Id = $id;
            type Event = $event;

            fn aggregate_type() -> &'static str {
                $name
            }

            fn id(&self) -> Self::Id {
                self.id
            }

            fn version(&self) -> common::Version {
                self.meta.version()
            }

            fn set_version(&mut self, version: common::Version) {
                self.meta.set_version(version);
            }

            fn pending_events(&self) -> &[Self::Event] {
                self.events.pending()
            }

            fn take_events(&mut self) -> Vec<Self::Event> {
                self.events.take()
            }
        }
    };
}

pub(crate) use impl_aggregate_root;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Noted {
        at: DateTime<Utc>,
    }

    impl DomainEvent for Noted {
        fn event_type(&self) -> &'static str {
            "Noted"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn test_events_take_drains_in_order() {
        let mut events = DomainEvents::default();
        let first = Utc::now();
        events.record(Noted { at: first });
        events.record(Noted { at: first });
        assert_eq!(events.len(), 2);

        let taken = events.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].occurred_at(), first);
        assert!(events.is_empty());
        assert!(events.take().is_empty());
    }

    #[test]
    fn test_entity_meta_tracks_updates() {
        let now = Utc::now();
        let mut meta = EntityMeta::new(now);
        assert_eq!(meta.version(), Version::initial());
        assert!(meta.updated_at().is_none());

        meta.mark_updated(now);
        meta.set_version(Version::first());
        assert_eq!(meta.updated_at(), Some(now));
        assert_eq!(meta.version(), Version::first());
    }
}

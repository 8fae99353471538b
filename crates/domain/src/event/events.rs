//! Community event domain events.

use chrono::{DateTime, Utc};
use common::{EventId, ImageId, SignUpListId, UserId};
use serde::{Deserialize, Serialize};

use crate::entity::DomainEvent;
use crate::value_objects::Money;

/// Events recorded by the community event aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventDomainEvent {
    Created {
        event_id: EventId,
        organizer_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    DetailsUpdated {
        event_id: EventId,
        occurred_at: DateTime<Utc>,
    },
    Published {
        event_id: EventId,
        occurred_at: DateTime<Utc>,
    },
    Cancelled {
        event_id: EventId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    Postponed {
        event_id: EventId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    CapacityUpdated {
        event_id: EventId,
        previous_capacity: u32,
        new_capacity: u32,
        occurred_at: DateTime<Utc>,
    },
    RegistrationConfirmed {
        event_id: EventId,
        user_id: UserId,
        quantity: u32,
        total_price: Option<Money>,
        occurred_at: DateTime<Utc>,
    },
    RegistrationCancelled {
        event_id: EventId,
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    ImageAdded {
        event_id: EventId,
        image_id: ImageId,
        occurred_at: DateTime<Utc>,
    },
    ImageRemoved {
        event_id: EventId,
        image_id: ImageId,
        blob_name: String,
        occurred_at: DateTime<Utc>,
    },
    SignUpListAdded {
        event_id: EventId,
        sign_up_list_id: SignUpListId,
        category: String,
        occurred_at: DateTime<Utc>,
    },
    SignUpListRemoved {
        event_id: EventId,
        sign_up_list_id: SignUpListId,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent for EventDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EventDomainEvent::Created { .. } => "EventCreated",
            EventDomainEvent::DetailsUpdated { .. } => "EventDetailsUpdated",
            EventDomainEvent::Published { .. } => "EventPublished",
            EventDomainEvent::Cancelled { .. } => "EventCancelled",
            EventDomainEvent::Postponed { .. } => "EventPostponed",
            EventDomainEvent::CapacityUpdated { .. } => "EventCapacityUpdated",
            EventDomainEvent::RegistrationConfirmed { .. } => "RegistrationConfirmed",
            EventDomainEvent::RegistrationCancelled { .. } => "RegistrationCancelled",
            EventDomainEvent::ImageAdded { .. } => "EventImageAdded",
            EventDomainEvent::ImageRemoved { .. } => "EventImageRemoved",
            EventDomainEvent::SignUpListAdded { .. } => "SignUpListAdded",
            EventDomainEvent::SignUpListRemoved { .. } => "SignUpListRemoved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EventDomainEvent::Created { occurred_at, .. }
            | EventDomainEvent::DetailsUpdated { occurred_at, .. }
            | EventDomainEvent::Published { occurred_at, .. }
            | EventDomainEvent::Cancelled { occurred_at, .. }
            | EventDomainEvent::Postponed { occurred_at, .. }
            | EventDomainEvent::CapacityUpdated { occurred_at, .. }
            | EventDomainEvent::RegistrationConfirmed { occurred_at, .. }
            | EventDomainEvent::RegistrationCancelled { occurred_at, .. }
            | EventDomainEvent::ImageAdded { occurred_at, .. }
            | EventDomainEvent::ImageRemoved { occurred_at, .. }
            | EventDomainEvent::SignUpListAdded { occurred_at, .. }
            | EventDomainEvent::SignUpListRemoved { occurred_at, .. } => *occurred_at,
        }
    }
}

//! Community event aggregate implementation.

use chrono::{DateTime, Utc};
use common::{EventId, ImageId, Outcome, SignUpListId, UserId};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainEvents, EntityMeta, impl_aggregate_root};
use crate::value_objects::{DateRange, EventDescription, EventTitle, Money};

use super::{EventCategory, EventDomainEvent, EventError, EventStatus, SignUpList};

/// The editable details of an event, replaced as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: EventTitle,
    pub description: EventDescription,
    pub schedule: DateRange,
    pub capacity: u32,
    pub category: EventCategory,
    pub ticket_price: Option<Money>,
}

/// A confirmed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub user_id: UserId,
    pub quantity: u32,
    /// Ticket price times quantity; `None` for free events.
    #[serde(default)]
    pub total_price: Option<Money>,
    pub registered_at: DateTime<Utc>,
}

/// An image stored in blob storage and shown in the event gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventImage {
    pub id: ImageId,
    pub url: String,
    pub blob_name: String,
    pub display_order: u32,
    pub uploaded_at: DateTime<Utc>,
}

/// Community event aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    organizer_id: UserId,
    details: EventDetails,
    status: EventStatus,
    published_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    postponement_reason: Option<String>,
    registrations: Vec<Registration>,
    images: Vec<EventImage>,
    sign_up_lists: Vec<SignUpList>,
    meta: EntityMeta,
    #[serde(skip)]
    events: DomainEvents<EventDomainEvent>,
}

impl_aggregate_root!(Event, EventId, EventDomainEvent, "Event");

impl Event {
    pub const MAX_IMAGES: usize = 10;
    pub const MAX_REASON_LENGTH: usize = 500;
}

// Query methods
impl Event {
    pub fn organizer_id(&self) -> UserId {
        self.organizer_id
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn title(&self) -> &EventTitle {
        &self.details.title
    }

    pub fn schedule(&self) -> DateRange {
        self.details.schedule
    }

    pub fn capacity(&self) -> u32 {
        self.details.capacity
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn postponement_reason(&self) -> Option<&str> {
        self.postponement_reason.as_deref()
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Seats taken across all registrations.
    pub fn registered_count(&self) -> u32 {
        self.registrations.iter().map(|r| r.quantity).sum()
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.details.capacity.saturating_sub(self.registered_count())
    }

    pub fn is_registered(&self, user_id: UserId) -> bool {
        self.registrations.iter().any(|r| r.user_id == user_id)
    }

    pub fn images(&self) -> &[EventImage] {
        &self.images
    }

    pub fn sign_up_lists(&self) -> &[SignUpList] {
        &self.sign_up_lists
    }

    pub fn sign_up_list(&self, id: SignUpListId) -> Option<&SignUpList> {
        self.sign_up_lists.iter().find(|list| list.id() == id)
    }

    pub fn has_sign_up_lists(&self) -> bool {
        !self.sign_up_lists.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }
}

// Command methods
impl Event {
    /// Creates a draft event.
    pub fn create(organizer_id: UserId, details: EventDetails, now: DateTime<Utc>) -> Outcome<Self> {
        if organizer_id.is_nil() {
            return Err(EventError::OrganizerRequired.into());
        }
        Self::validate_details(&details, now)?;

        let id = EventId::new();
        let mut event = Self {
            id,
            organizer_id,
            details,
            status: EventStatus::Draft,
            published_at: None,
            cancellation_reason: None,
            postponement_reason: None,
            registrations: Vec::new(),
            images: Vec::new(),
            sign_up_lists: Vec::new(),
            meta: EntityMeta::new(now),
            events: DomainEvents::default(),
        };
        event.events.record(EventDomainEvent::Created {
            event_id: id,
            organizer_id,
            occurred_at: now,
        });
        Ok(event)
    }

    /// Replaces title, description, schedule, capacity and category in one
    /// step. Draft only.
    pub fn update_details(&mut self, details: EventDetails, now: DateTime<Utc>) -> Outcome {
        if !self.status.can_update_details() {
            return Err(EventError::UpdateRequiresDraft.into());
        }
        Self::validate_details(&details, now)?;
        if details.capacity < self.registered_count() {
            return Err(EventError::CapacityBelowRegistrations.into());
        }

        self.details = details;
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::DetailsUpdated {
            event_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn publish(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.status == EventStatus::Published {
            return Err(EventError::AlreadyPublished.into());
        }
        if !self.status.can_publish() {
            return Err(EventError::PublishRequiresDraft.into());
        }

        self.status = EventStatus::Published;
        self.published_at.get_or_insert(now);
        self.postponement_reason = None;
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::Published {
            event_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> Outcome {
        if !self.status.can_cancel() {
            return Err(EventError::CancelRequiresPublished.into());
        }
        let reason = Self::validate_reason(reason, "Cancellation")?;

        self.status = EventStatus::Cancelled;
        self.cancellation_reason = Some(reason.clone());
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::Cancelled {
            event_id: self.id,
            reason,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn postpone(&mut self, reason: &str, now: DateTime<Utc>) -> Outcome {
        if !self.status.can_postpone() {
            return Err(EventError::PostponeRequiresPublished.into());
        }
        let reason = Self::validate_reason(reason, "Postponement")?;

        self.status = EventStatus::Postponed;
        self.postponement_reason = Some(reason.clone());
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::Postponed {
            event_id: self.id,
            reason,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn register(&mut self, user_id: UserId, quantity: u32, now: DateTime<Utc>) -> Outcome {
        if !self.status.accepts_registrations() {
            return Err(EventError::NotPublished.into());
        }
        if quantity == 0 {
            return Err(EventError::InvalidQuantity.into());
        }
        if self.is_registered(user_id) {
            return Err(EventError::AlreadyRegistered.into());
        }
        if quantity > self.remaining_capacity() {
            return Err(EventError::AtCapacity.into());
        }
        let total_price = self
            .details
            .ticket_price
            .map(|price| price.multiply(quantity))
            .transpose()?;

        self.registrations.push(Registration {
            user_id,
            quantity,
            total_price,
            registered_at: now,
        });
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::RegistrationConfirmed {
            event_id: self.id,
            user_id,
            quantity,
            total_price,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn cancel_registration(&mut self, user_id: UserId, now: DateTime<Utc>) -> Outcome {
        if !self.is_registered(user_id) {
            return Err(EventError::NotRegistered.into());
        }

        self.registrations.retain(|r| r.user_id != user_id);
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::RegistrationCancelled {
            event_id: self.id,
            user_id,
            occurred_at: now,
        });
        Ok(())
    }

    pub fn update_capacity(&mut self, new_capacity: u32, now: DateTime<Utc>) -> Outcome {
        if new_capacity == 0 {
            return Err(EventError::InvalidCapacity.into());
        }
        if new_capacity < self.registered_count() {
            return Err(EventError::CapacityBelowRegistrations.into());
        }

        let previous_capacity = self.details.capacity;
        self.details.capacity = new_capacity;
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::CapacityUpdated {
            event_id: self.id,
            previous_capacity,
            new_capacity,
            occurred_at: now,
        });
        Ok(())
    }

    /// Appends an already-uploaded image to the gallery.
    pub fn add_image(&mut self, url: &str, blob_name: &str, now: DateTime<Utc>) -> Outcome<ImageId> {
        let (url, blob_name) = (url.trim(), blob_name.trim());
        if url.is_empty() {
            return Err(EventError::ImageUrlRequired.into());
        }
        if blob_name.is_empty() {
            return Err(EventError::BlobNameRequired.into());
        }
        if self.images.len() >= Self::MAX_IMAGES {
            return Err(EventError::TooManyImages(Self::MAX_IMAGES).into());
        }

        let image = EventImage {
            id: ImageId::new(),
            url: url.to_string(),
            blob_name: blob_name.to_string(),
            display_order: self.images.len() as u32 + 1,
            uploaded_at: now,
        };
        let image_id = image.id;
        self.images.push(image);
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::ImageAdded {
            event_id: self.id,
            image_id,
            occurred_at: now,
        });
        Ok(image_id)
    }

    /// Removes an image and returns it so its blob can be cleaned up.
    pub fn remove_image(&mut self, image_id: ImageId, now: DateTime<Utc>) -> Outcome<EventImage> {
        let position = self
            .images
            .iter()
            .position(|image| image.id == image_id)
            .ok_or(EventError::ImageNotFound)?;

        let removed = self.images.remove(position);
        for (index, image) in self.images.iter_mut().enumerate() {
            image.display_order = index as u32 + 1;
        }
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::ImageRemoved {
            event_id: self.id,
            image_id,
            blob_name: removed.blob_name.clone(),
            occurred_at: now,
        });
        Ok(removed)
    }

    pub fn add_sign_up_list(&mut self, list: SignUpList, now: DateTime<Utc>) -> Outcome<SignUpListId> {
        if self
            .sign_up_lists
            .iter()
            .any(|existing| existing.category().eq_ignore_ascii_case(list.category()))
        {
            return Err(EventError::DuplicateSignUpCategory(list.category().to_string()).into());
        }

        let sign_up_list_id = list.id();
        let category = list.category().to_string();
        self.sign_up_lists.push(list);
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::SignUpListAdded {
            event_id: self.id,
            sign_up_list_id,
            category,
            occurred_at: now,
        });
        Ok(sign_up_list_id)
    }

    pub fn remove_sign_up_list(&mut self, id: SignUpListId, now: DateTime<Utc>) -> Outcome<SignUpList> {
        let position = self
            .sign_up_lists
            .iter()
            .position(|list| list.id() == id)
            .ok_or(EventError::SignUpListNotFound)?;
        if self.sign_up_lists[position].has_commitments() {
            return Err(EventError::SignUpListHasCommitments.into());
        }

        let removed = self.sign_up_lists.remove(position);
        self.meta.mark_updated(now);
        self.events.record(EventDomainEvent::SignUpListRemoved {
            event_id: self.id,
            sign_up_list_id: id,
            occurred_at: now,
        });
        Ok(removed)
    }

    /// Gives mutable access to one sign-up list for commitments.
    pub fn sign_up_list_mut(&mut self, id: SignUpListId, now: DateTime<Utc>) -> Outcome<&mut SignUpList> {
        let list = self
            .sign_up_lists
            .iter_mut()
            .find(|list| list.id() == id)
            .ok_or(EventError::SignUpListNotFound)?;
        self.meta.mark_updated(now);
        Ok(list)
    }

    /// Checks the event may be removed.
    pub fn ensure_deletable(&self) -> Outcome {
        if !self.status.can_delete() {
            return Err(EventError::DeleteRequiresDraftOrCancelled.into());
        }
        Ok(())
    }

    fn validate_details(details: &EventDetails, now: DateTime<Utc>) -> Outcome {
        if !details.schedule.starts_after(now) {
            return Err(EventError::StartInPast.into());
        }
        if details.capacity == 0 {
            return Err(EventError::InvalidCapacity.into());
        }
        Ok(())
    }

    fn validate_reason(reason: &str, label: &'static str) -> Outcome<String> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EventError::ReasonRequired(label).into());
        }
        common::max_length(reason, &format!("{label} reason"), Self::MAX_REASON_LENGTH)?;
        Ok(reason.to_string())
    }
}

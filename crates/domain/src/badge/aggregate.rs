use chrono::{DateTime, Utc};
use common::{BadgeId, Failure, Outcome, UserId, Validator};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainEvent, DomainEvents, EntityMeta, impl_aggregate_root};
use crate::value_objects::{BadgeName, BadgePlacements};

use super::BadgeError;

/// Events recorded by the badge aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BadgeDomainEvent {
    Created {
        badge_id: BadgeId,
        occurred_at: DateTime<Utc>,
    },
    ImageReplaced {
        badge_id: BadgeId,
        previous_blob_name: String,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent for BadgeDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BadgeDomainEvent::Created { .. } => "BadgeCreated",
            BadgeDomainEvent::ImageReplaced { .. } => "BadgeImageReplaced",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BadgeDomainEvent::Created { occurred_at, .. }
            | BadgeDomainEvent::ImageReplaced { occurred_at, .. } => *occurred_at,
        }
    }
}

/// A badge overlaid on event images (e.g. "New", "Featured").
///
/// System badges are seeded by the platform: they have no creator, their
/// name, placement and order are fixed, and they cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    id: BadgeId,
    name: BadgeName,
    image_url: String,
    blob_name: String,
    placements: BadgePlacements,
    display_order: i32,
    is_active: bool,
    is_system: bool,
    created_by: Option<UserId>,
    meta: EntityMeta,
    #[serde(skip)]
    events: DomainEvents<BadgeDomainEvent>,
}

impl_aggregate_root!(Badge, BadgeId, BadgeDomainEvent, "Badge");

// Query methods
impl Badge {
    pub fn name(&self) -> &BadgeName {
        &self.name
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn blob_name(&self) -> &str {
        &self.blob_name
    }

    pub fn placements(&self) -> &BadgePlacements {
        &self.placements
    }

    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn can_delete(&self) -> bool {
        !self.is_system
    }
}

// Command methods
impl Badge {
    pub fn create(
        name: &str,
        image_url: &str,
        blob_name: &str,
        placements: BadgePlacements,
        display_order: i32,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Outcome<Self> {
        let mut validator = Validator::new();
        if created_by.is_nil() {
            validator.push(BadgeError::CreatorRequired.into());
        }
        let badge = Self::build(
            &mut validator,
            name,
            image_url,
            blob_name,
            placements,
            display_order,
            now,
        );
        validator.finish()?;

        let mut badge = badge.ok_or_else(|| Failure::validation("Badge is incomplete"))?;
        badge.created_by = Some(created_by);
        Ok(badge)
    }

    /// Creates a platform-owned badge.
    pub fn create_system(
        name: &str,
        image_url: &str,
        blob_name: &str,
        placements: BadgePlacements,
        display_order: i32,
        now: DateTime<Utc>,
    ) -> Outcome<Self> {
        let mut validator = Validator::new();
        let badge = Self::build(
            &mut validator,
            name,
            image_url,
            blob_name,
            placements,
            display_order,
            now,
        );
        validator.finish()?;

        let mut badge = badge.ok_or_else(|| Failure::validation("Badge is incomplete"))?;
        badge.is_system = true;
        Ok(badge)
    }

    pub fn update(
        &mut self,
        name: &str,
        placements: BadgePlacements,
        display_order: i32,
        now: DateTime<Utc>,
    ) -> Outcome {
        if self.is_system {
            return Err(BadgeError::SystemBadgeImmutable.into());
        }
        let name = BadgeName::create(name)?;
        if display_order < 0 {
            return Err(BadgeError::NegativeDisplayOrder.into());
        }

        self.name = name;
        self.placements = placements;
        self.display_order = display_order;
        self.meta.mark_updated(now);
        Ok(())
    }

    /// Points the badge at a new image and returns the blob it replaced.
    pub fn update_image(&mut self, image_url: &str, blob_name: &str, now: DateTime<Utc>) -> Outcome<String> {
        let (image_url, blob_name) = (image_url.trim(), blob_name.trim());
        if image_url.is_empty() {
            return Err(BadgeError::ImageUrlRequired.into());
        }
        if blob_name.is_empty() {
            return Err(BadgeError::BlobNameRequired.into());
        }

        self.image_url = image_url.to_string();
        let previous = std::mem::replace(&mut self.blob_name, blob_name.to_string());
        self.meta.mark_updated(now);
        self.events.record(BadgeDomainEvent::ImageReplaced {
            badge_id: self.id,
            previous_blob_name: previous.clone(),
            occurred_at: now,
        });
        Ok(previous)
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.is_active {
            return Err(BadgeError::AlreadyActive.into());
        }
        self.is_active = true;
        self.meta.mark_updated(now);
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Outcome {
        if !self.is_active {
            return Err(BadgeError::AlreadyInactive.into());
        }
        self.is_active = false;
        self.meta.mark_updated(now);
        Ok(())
    }

    /// Checks the badge may be removed.
    pub fn ensure_deletable(&self) -> Outcome {
        if !self.can_delete() {
            return Err(BadgeError::SystemBadgeNotDeletable.into());
        }
        Ok(())
    }

    fn build(
        validator: &mut Validator,
        name: &str,
        image_url: &str,
        blob_name: &str,
        placements: BadgePlacements,
        display_order: i32,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let name = validator.collect(BadgeName::create(name));
        let (image_url, blob_name) = (image_url.trim(), blob_name.trim());
        if image_url.is_empty() {
            validator.push(BadgeError::ImageUrlRequired.into());
        }
        if blob_name.is_empty() {
            validator.push(BadgeError::BlobNameRequired.into());
        }
        if display_order < 0 {
            validator.push(BadgeError::NegativeDisplayOrder.into());
        }

        let id = BadgeId::new();
        let mut events = DomainEvents::default();
        events.record(BadgeDomainEvent::Created {
            badge_id: id,
            occurred_at: now,
        });
        Some(Self {
            id,
            name: name?,
            image_url: image_url.to_string(),
            blob_name: blob_name.to_string(),
            placements,
            display_order,
            is_active: true,
            is_system: false,
            created_by: None,
            meta: EntityMeta::new(now),
            events,
        })
    }
}

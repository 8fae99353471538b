//! Newsletter domain events.

use chrono::{DateTime, Utc};
use common::{NewsletterId, UserId};
use serde::{Deserialize, Serialize};

use crate::entity::DomainEvent;

/// Events recorded by the newsletter aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NewsletterDomainEvent {
    /// A draft was written.
    Created {
        newsletter_id: NewsletterId,
        created_by: UserId,
        occurred_at: DateTime<Utc>,
    },

    /// The draft went live.
    Published {
        newsletter_id: NewsletterId,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },

    /// The newsletter was pulled back to draft.
    Unpublished {
        newsletter_id: NewsletterId,
        occurred_at: DateTime<Utc>,
    },

    /// Emails went out for the first time.
    Sent {
        newsletter_id: NewsletterId,
        occurred_at: DateTime<Utc>,
    },

    /// The newsletter expired.
    Deactivated {
        newsletter_id: NewsletterId,
        occurred_at: DateTime<Utc>,
    },

    /// An expired newsletter went live again.
    Reactivated {
        newsletter_id: NewsletterId,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent for NewsletterDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            NewsletterDomainEvent::Created { .. } => "NewsletterCreated",
            NewsletterDomainEvent::Published { .. } => "NewsletterPublished",
            NewsletterDomainEvent::Unpublished { .. } => "NewsletterUnpublished",
            NewsletterDomainEvent::Sent { .. } => "NewsletterSent",
            NewsletterDomainEvent::Deactivated { .. } => "NewsletterDeactivated",
            NewsletterDomainEvent::Reactivated { .. } => "NewsletterReactivated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            NewsletterDomainEvent::Created { occurred_at, .. }
            | NewsletterDomainEvent::Published { occurred_at, .. }
            | NewsletterDomainEvent::Unpublished { occurred_at, .. }
            | NewsletterDomainEvent::Sent { occurred_at, .. }
            | NewsletterDomainEvent::Deactivated { occurred_at, .. }
            | NewsletterDomainEvent::Reactivated { occurred_at, .. } => *occurred_at,
        }
    }
}

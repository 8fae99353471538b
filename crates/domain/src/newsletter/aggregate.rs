//! Newsletter aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::{EventId, NewsletterId, Outcome, UserId};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainEvents, EntityMeta, impl_aggregate_root};
use crate::value_objects::{NewsletterDescription, NewsletterTitle};

use super::{NewsletterAudience, NewsletterDomainEvent, NewsletterError, NewsletterStatus};

/// Newsletter aggregate root.
///
/// A newsletter is written as a draft, published for a fixed window, emailed
/// to its audience and eventually expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newsletter {
    id: NewsletterId,
    title: NewsletterTitle,
    description: NewsletterDescription,
    created_by: UserId,
    audience: NewsletterAudience,
    /// Event the newsletter promotes, if any.
    event_id: Option<EventId>,
    is_announcement_only: bool,
    status: NewsletterStatus,
    published_at: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    meta: EntityMeta,
    #[serde(skip)]
    events: DomainEvents<NewsletterDomainEvent>,
}

impl_aggregate_root!(Newsletter, NewsletterId, NewsletterDomainEvent, "Newsletter");

impl Newsletter {
    /// Days a published or reactivated newsletter stays active.
    pub const ACTIVE_DAYS: i64 = 7;

    fn active_window() -> Duration {
        Duration::days(Self::ACTIVE_DAYS)
    }
}

// Query methods
impl Newsletter {
    pub fn title(&self) -> &NewsletterTitle {
        &self.title
    }

    pub fn description(&self) -> &NewsletterDescription {
        &self.description
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn audience(&self) -> &NewsletterAudience {
        &self.audience
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    pub fn is_announcement_only(&self) -> bool {
        self.is_announcement_only
    }

    pub fn status(&self) -> NewsletterStatus {
        self.status
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.meta.updated_at()
    }

    /// Returns true once emails have gone out.
    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    /// Returns true for an active newsletter whose window has closed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == NewsletterStatus::Active && self.expires_at.is_some_and(|at| at <= now)
    }
}

// Command methods
impl Newsletter {
    /// Creates a draft newsletter.
    pub fn create(
        title: NewsletterTitle,
        description: NewsletterDescription,
        created_by: UserId,
        audience: NewsletterAudience,
        event_id: Option<EventId>,
        is_announcement_only: bool,
        now: DateTime<Utc>,
    ) -> Outcome<Self> {
        if created_by.is_nil() {
            return Err(NewsletterError::CreatorRequired.into());
        }

        let id = NewsletterId::new();
        let mut newsletter = Self {
            id,
            title,
            description,
            created_by,
            audience,
            event_id,
            is_announcement_only,
            status: NewsletterStatus::Draft,
            published_at: None,
            sent_at: None,
            expires_at: None,
            meta: EntityMeta::new(now),
            events: DomainEvents::default(),
        };
        newsletter.events.record(NewsletterDomainEvent::Created {
            newsletter_id: id,
            created_by,
            occurred_at: now,
        });
        Ok(newsletter)
    }

    /// Replaces the editable content of a draft.
    pub fn update(
        &mut self,
        title: NewsletterTitle,
        description: NewsletterDescription,
        audience: NewsletterAudience,
        event_id: Option<EventId>,
        is_announcement_only: bool,
        now: DateTime<Utc>,
    ) -> Outcome {
        self.ensure(self.status.can_update(), "update")?;

        self.title = title;
        self.description = description;
        self.audience = audience;
        self.event_id = event_id;
        self.is_announcement_only = is_announcement_only;
        self.meta.mark_updated(now);
        Ok(())
    }

    /// Draft → Active. Opens the active window starting at `now`.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Outcome {
        if self.status == NewsletterStatus::Active {
            return Err(NewsletterError::AlreadyActive.into());
        }
        self.ensure(self.status.can_publish(), "publish")?;

        let expires_at = now + Self::active_window();
        self.status = NewsletterStatus::Active;
        self.published_at = Some(now);
        self.expires_at = Some(expires_at);
        self.meta.mark_updated(now);
        self.events.record(NewsletterDomainEvent::Published {
            newsletter_id: self.id,
            expires_at,
            occurred_at: now,
        });
        Ok(())
    }

    /// Active → Draft, only while nothing has been sent.
    pub fn unpublish(&mut self, now: DateTime<Utc>) -> Outcome {
        self.ensure(self.status.can_unpublish(), "unpublish")?;
        if self.is_sent() {
            return Err(NewsletterError::UnpublishAfterSend.into());
        }

        self.status = NewsletterStatus::Draft;
        self.published_at = None;
        self.expires_at = None;
        self.meta.mark_updated(now);
        self.events.record(NewsletterDomainEvent::Unpublished {
            newsletter_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    /// Stamps the one-time send. The newsletter stays Active.
    pub fn mark_as_sent(&mut self, now: DateTime<Utc>) -> Outcome {
        self.ensure(self.status.can_send(), "send")?;
        if self.is_sent() {
            return Err(NewsletterError::AlreadySent.into());
        }

        self.sent_at = Some(now);
        self.meta.mark_updated(now);
        self.events.record(NewsletterDomainEvent::Sent {
            newsletter_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    /// Active → Inactive once the window has closed.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Outcome {
        self.ensure(self.status.can_deactivate(), "deactivate")?;
        if !self.is_expired(now) {
            return Err(NewsletterError::NotExpired.into());
        }

        self.status = NewsletterStatus::Inactive;
        self.meta.mark_updated(now);
        self.events.record(NewsletterDomainEvent::Deactivated {
            newsletter_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    /// Inactive → Active, extending the expiry by the active window.
    ///
    /// The extension counts from the later of the old expiry and `now`, so a
    /// long-expired newsletter still gets a full window.
    pub fn reactivate(&mut self, now: DateTime<Utc>) -> Outcome {
        self.ensure(self.status.can_reactivate(), "reactivate")?;

        let base = self.expires_at.map_or(now, |at| at.max(now));
        let expires_at = base + Self::active_window();
        self.status = NewsletterStatus::Active;
        self.expires_at = Some(expires_at);
        self.meta.mark_updated(now);
        self.events.record(NewsletterDomainEvent::Reactivated {
            newsletter_id: self.id,
            expires_at,
            occurred_at: now,
        });
        Ok(())
    }

    /// Checks the newsletter may be removed.
    pub fn ensure_deletable(&self) -> Outcome {
        if !self.status.can_delete() {
            return Err(NewsletterError::DeleteRequiresDraft.into());
        }
        Ok(())
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Outcome {
        if allowed {
            Ok(())
        } else {
            Err(NewsletterError::InvalidStateTransition {
                current_state: self.status,
                action,
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AggregateRoot;
    use common::{EmailGroupId, ErrorKind, OutcomeExt};

    fn now() -> DateTime<Utc> {
        "2026-03-01T10:00:00Z".parse().unwrap()
    }

    fn draft() -> Newsletter {
        Newsletter::create(
            NewsletterTitle::create("March community update").unwrap(),
            NewsletterDescription::create("Festival season is here.").unwrap(),
            UserId::new(),
            NewsletterAudience::email_groups(vec![EmailGroupId::new()]).unwrap(),
            None,
            false,
            now(),
        )
        .unwrap()
    }

    fn active() -> Newsletter {
        let mut newsletter = draft();
        newsletter.publish(now()).unwrap();
        newsletter
    }

    #[test]
    fn test_create_starts_as_draft_with_event() {
        let newsletter = draft();
        assert_eq!(newsletter.status(), NewsletterStatus::Draft);
        assert_eq!(newsletter.pending_events().len(), 1);
        assert_eq!(
            crate::entity::DomainEvent::event_type(&newsletter.pending_events()[0]),
            "NewsletterCreated"
        );
    }

    #[test]
    fn test_create_requires_creator() {
        let outcome = Newsletter::create(
            NewsletterTitle::create("t").unwrap(),
            NewsletterDescription::create("d").unwrap(),
            UserId::nil(),
            NewsletterAudience::email_groups(vec![EmailGroupId::new()]).unwrap(),
            None,
            false,
            now(),
        );
        assert_eq!(outcome.messages(), vec!["Creator ID is required"]);
    }

    #[test]
    fn test_publish_opens_seven_day_window() {
        let newsletter = active();
        assert_eq!(newsletter.status(), NewsletterStatus::Active);
        assert_eq!(newsletter.published_at(), Some(now()));
        assert_eq!(newsletter.expires_at(), Some(now() + Duration::days(7)));
    }

    #[test]
    fn test_publish_twice_fails() {
        let mut newsletter = active();
        let outcome = newsletter.publish(now());
        assert_eq!(outcome.messages(), vec!["Newsletter is already active"]);
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::DomainRule);
    }

    #[test]
    fn test_unpublish_returns_to_draft() {
        let mut newsletter = active();
        newsletter.unpublish(now()).unwrap();
        assert_eq!(newsletter.status(), NewsletterStatus::Draft);
        assert!(newsletter.published_at().is_none());
        assert!(newsletter.expires_at().is_none());
    }

    #[test]
    fn test_unpublish_after_send_fails_without_mutation() {
        let mut newsletter = active();
        newsletter.mark_as_sent(now()).unwrap();
        let expires_at = newsletter.expires_at();

        let outcome = newsletter.unpublish(now());
        assert!(outcome.unwrap_err().mentions("after it has been sent"));
        assert_eq!(newsletter.status(), NewsletterStatus::Active);
        assert_eq!(newsletter.expires_at(), expires_at);
        assert_eq!(newsletter.sent_at(), Some(now()));
    }

    #[test]
    fn test_send_keeps_active_status() {
        let mut newsletter = active();
        newsletter.mark_as_sent(now()).unwrap();
        assert!(newsletter.is_sent());
        assert_eq!(newsletter.status(), NewsletterStatus::Active);
    }

    #[test]
    fn test_send_twice_fails() {
        let mut newsletter = active();
        newsletter.mark_as_sent(now()).unwrap();
        assert!(newsletter.mark_as_sent(now() + Duration::hours(1)).is_err());
        assert_eq!(newsletter.sent_at(), Some(now()));
    }

    #[test]
    fn test_send_draft_fails() {
        let mut newsletter = draft();
        let outcome = newsletter.mark_as_sent(now());
        assert!(outcome.is_failure());
        assert!(newsletter.sent_at().is_none());
    }

    #[test]
    fn test_deactivate_requires_expiry() {
        let mut newsletter = active();
        let outcome = newsletter.deactivate(now() + Duration::days(1));
        assert_eq!(outcome.messages(), vec!["Newsletter has not expired yet"]);

        newsletter.deactivate(now() + Duration::days(7)).unwrap();
        assert_eq!(newsletter.status(), NewsletterStatus::Inactive);
    }

    #[test]
    fn test_reactivate_extends_from_now_when_long_expired() {
        let mut newsletter = active();
        let later = now() + Duration::days(30);
        newsletter.deactivate(later).unwrap();
        newsletter.reactivate(later).unwrap();
        assert_eq!(newsletter.status(), NewsletterStatus::Active);
        assert_eq!(newsletter.expires_at(), Some(later + Duration::days(7)));
    }

    #[test]
    fn test_reactivate_from_draft_fails() {
        let mut newsletter = draft();
        let outcome = newsletter.reactivate(now());
        assert!(outcome.unwrap_err().mentions("cannot reactivate"));
        assert_eq!(newsletter.status(), NewsletterStatus::Draft);
        assert!(newsletter.expires_at().is_none());
    }

    #[test]
    fn test_only_drafts_are_deletable() {
        assert!(draft().ensure_deletable().is_ok());
        assert_eq!(
            active().ensure_deletable().messages(),
            vec!["Only draft newsletters can be deleted"]
        );
    }

    #[test]
    fn test_update_requires_draft() {
        let mut newsletter = active();
        let outcome = newsletter.update(
            NewsletterTitle::create("New").unwrap(),
            NewsletterDescription::create("Body").unwrap(),
            newsletter.audience().clone(),
            None,
            true,
            now(),
        );
        assert!(outcome.is_failure());
        assert_eq!(newsletter.title().as_str(), "March community update");
    }

    #[test]
    fn test_events_are_not_serialized() {
        let newsletter = active();
        let json = serde_json::to_value(&newsletter).unwrap();
        assert!(json.get("events").is_none());

        let restored: Newsletter = serde_json::from_value(json).unwrap();
        assert!(restored.pending_events().is_empty());
        assert_eq!(restored.status(), NewsletterStatus::Active);
    }
}

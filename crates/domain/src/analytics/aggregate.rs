use chrono::{DateTime, Utc};
use common::{AnalyticsId, EventId, Outcome, UserId};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainEvent, DomainEvents, EntityMeta, impl_aggregate_root};

use super::viewer::parse_ip;
use super::AnalyticsError;

/// Events recorded by the analytics aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalyticsDomainEvent {
    ViewRecorded {
        event_id: EventId,
        user_id: Option<UserId>,
        ip_address: String,
        occurred_at: DateTime<Utc>,
    },
    ShareRecorded {
        event_id: EventId,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent for AnalyticsDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AnalyticsDomainEvent::ViewRecorded { .. } => "EventViewRecorded",
            AnalyticsDomainEvent::ShareRecorded { .. } => "EventShareRecorded",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AnalyticsDomainEvent::ViewRecorded { occurred_at, .. }
            | AnalyticsDomainEvent::ShareRecorded { occurred_at, .. } => *occurred_at,
        }
    }
}

/// Counters for one community event. There is exactly one per event and its
/// id is derived from the event id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAnalytics {
    id: AnalyticsId,
    event_id: EventId,
    total_views: u64,
    unique_viewers: u64,
    registration_count: u64,
    share_count: u64,
    last_viewed_at: Option<DateTime<Utc>>,
    meta: EntityMeta,
    #[serde(skip)]
    events: DomainEvents<AnalyticsDomainEvent>,
}

impl_aggregate_root!(EventAnalytics, AnalyticsId, AnalyticsDomainEvent, "EventAnalytics");

impl EventAnalytics {
    /// The analytics id that belongs to `event_id`.
    pub fn id_for(event_id: EventId) -> AnalyticsId {
        AnalyticsId::from_uuid(event_id.as_uuid())
    }

    pub fn create(event_id: EventId, now: DateTime<Utc>) -> Outcome<Self> {
        if event_id.is_nil() {
            return Err(AnalyticsError::EventRequired.into());
        }
        Ok(Self {
            id: Self::id_for(event_id),
            event_id,
            total_views: 0,
            unique_viewers: 0,
            registration_count: 0,
            share_count: 0,
            last_viewed_at: None,
            meta: EntityMeta::new(now),
            events: DomainEvents::default(),
        })
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn total_views(&self) -> u64 {
        self.total_views
    }

    pub fn unique_viewers(&self) -> u64 {
        self.unique_viewers
    }

    pub fn registration_count(&self) -> u64 {
        self.registration_count
    }

    pub fn share_count(&self) -> u64 {
        self.share_count
    }

    pub fn last_viewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_viewed_at
    }

    /// Registrations per hundred views, rounded to two decimals.
    pub fn conversion_rate(&self) -> f64 {
        if self.total_views == 0 {
            return 0.0;
        }
        let rate = self.registration_count as f64 / self.total_views as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }

    /// Counts one view. De-duplication happens before this is called.
    pub fn record_view(&mut self, user_id: Option<UserId>, ip_address: &str, now: DateTime<Utc>) -> Outcome {
        let ip = parse_ip(ip_address)?;

        self.total_views += 1;
        self.last_viewed_at = Some(now);
        self.meta.mark_updated(now);
        self.events.record(AnalyticsDomainEvent::ViewRecorded {
            event_id: self.event_id,
            user_id,
            ip_address: ip.to_string(),
            occurred_at: now,
        });
        Ok(())
    }

    pub fn record_unique_viewer(&mut self, now: DateTime<Utc>) {
        self.unique_viewers += 1;
        self.meta.mark_updated(now);
    }

    pub fn record_share(&mut self, now: DateTime<Utc>) {
        self.share_count += 1;
        self.meta.mark_updated(now);
        self.events.record(AnalyticsDomainEvent::ShareRecorded {
            event_id: self.event_id,
            occurred_at: now,
        });
    }

    pub fn update_registration_count(&mut self, count: u64, now: DateTime<Utc>) {
        self.registration_count = count;
        self.meta.mark_updated(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AggregateRoot;
    use common::OutcomeExt;

    fn analytics() -> EventAnalytics {
        EventAnalytics::create(EventId::new(), Utc::now()).unwrap()
    }

    #[test]
    fn test_new_analytics_is_empty() {
        let analytics = analytics();
        assert_eq!(analytics.total_views(), 0);
        assert_eq!(analytics.conversion_rate(), 0.0);
        assert!(analytics.last_viewed_at().is_none());
    }

    #[test]
    fn test_id_follows_event() {
        let event_id = EventId::new();
        let analytics = EventAnalytics::create(event_id, Utc::now()).unwrap();
        assert_eq!(analytics.id().as_uuid(), event_id.as_uuid());
        assert!(EventAnalytics::create(EventId::nil(), Utc::now()).is_failure());
    }

    #[test]
    fn test_record_view_updates_counters_and_events() {
        let mut analytics = analytics();
        let now = Utc::now();
        analytics.record_view(None, "1.2.3.4", now).unwrap();

        assert_eq!(analytics.total_views(), 1);
        assert_eq!(analytics.last_viewed_at(), Some(now));
        assert_eq!(analytics.pending_events()[0].event_type(), "EventViewRecorded");
    }

    #[test]
    fn test_bad_ip_changes_nothing() {
        let mut analytics = analytics();
        let outcome = analytics.record_view(None, "999.1.1.1", Utc::now());
        assert!(outcome.is_failure());
        assert_eq!(analytics.total_views(), 0);
        assert!(analytics.pending_events().is_empty());
    }

    #[test]
    fn test_conversion_rate_rounds() {
        let mut analytics = analytics();
        for _ in 0..3 {
            analytics.record_view(None, "1.2.3.4", Utc::now()).unwrap();
        }
        analytics.update_registration_count(1, Utc::now());
        assert_eq!(analytics.conversion_rate(), 33.33);
    }

    #[test]
    fn test_shares_and_unique_viewers() {
        let mut analytics = analytics();
        analytics.record_share(Utc::now());
        analytics.record_unique_viewer(Utc::now());
        assert_eq!(analytics.share_count(), 1);
        assert_eq!(analytics.unique_viewers(), 1);
    }
}

//! Read models returned by handlers.

use chrono::{DateTime, Utc};
use common::{
    AnalyticsId, BadgeId, BusinessId, EmailGroupId, EventId, ImageId, MetroAreaId, NewsletterId,
    UserId,
};
use domain::value_objects::{BadgePlacements, Money};
use domain::{
    AggregateRoot, Badge, Business, BusinessCategory, BusinessImage, BusinessStatus, Event,
    EventAnalytics, EventCategory, EventImage, EventStatus, Newsletter, NewsletterStatus,
    SignUpList,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterDto {
    pub id: NewsletterId,
    pub title: String,
    pub description: String,
    pub created_by: UserId,
    pub email_group_ids: Vec<EmailGroupId>,
    pub include_newsletter_subscribers: bool,
    pub metro_area_ids: Vec<MetroAreaId>,
    pub target_all_locations: bool,
    pub event_id: Option<EventId>,
    pub is_announcement_only: bool,
    pub status: NewsletterStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Newsletter> for NewsletterDto {
    fn from(newsletter: &Newsletter) -> Self {
        let audience = newsletter.audience();
        Self {
            id: newsletter.id(),
            title: newsletter.title().to_string(),
            description: newsletter.description().to_string(),
            created_by: newsletter.created_by(),
            email_group_ids: audience.email_group_ids().to_vec(),
            include_newsletter_subscribers: audience.include_newsletter_subscribers(),
            metro_area_ids: audience.metro_area_ids().to_vec(),
            target_all_locations: audience.target_all_locations(),
            event_id: newsletter.event_id(),
            is_announcement_only: newsletter.is_announcement_only(),
            status: newsletter.status(),
            published_at: newsletter.published_at(),
            sent_at: newsletter.sent_at(),
            expires_at: newsletter.expires_at(),
            created_at: newsletter.created_at(),
        }
    }
}

/// Result of sending a newsletter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReport {
    pub newsletter: NewsletterDto,
    pub recipients: usize,
    pub delivered: usize,
    /// Recipient-level failures, one message each.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDto {
    pub id: EventId,
    pub organizer_id: UserId,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub capacity: u32,
    pub registered: u32,
    pub category: EventCategory,
    pub ticket_price: Option<Money>,
    pub status: EventStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub images: Vec<EventImage>,
    pub sign_up_lists: Vec<SignUpList>,
    pub created_at: DateTime<Utc>,
}

impl From<&Event> for EventDto {
    fn from(event: &Event) -> Self {
        let details = event.details();
        Self {
            id: event.id(),
            organizer_id: event.organizer_id(),
            title: details.title.to_string(),
            description: details.description.to_string(),
            start_date: details.schedule.start(),
            end_date: details.schedule.end(),
            capacity: details.capacity,
            registered: event.registered_count(),
            category: details.category,
            ticket_price: details.ticket_price,
            status: event.status(),
            published_at: event.published_at(),
            cancellation_reason: event.cancellation_reason().map(str::to_string),
            images: event.images().to_vec(),
            sign_up_lists: event.sign_up_lists().to_vec(),
            created_at: event.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsDto {
    pub id: AnalyticsId,
    pub event_id: EventId,
    pub total_views: u64,
    pub unique_viewers: u64,
    pub registration_count: u64,
    pub share_count: u64,
    pub conversion_rate: f64,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

impl From<&EventAnalytics> for AnalyticsDto {
    fn from(analytics: &EventAnalytics) -> Self {
        Self {
            id: analytics.id(),
            event_id: analytics.event_id(),
            total_views: analytics.total_views(),
            unique_viewers: analytics.unique_viewers(),
            registration_count: analytics.registration_count(),
            share_count: analytics.share_count(),
            conversion_rate: analytics.conversion_rate(),
            last_viewed_at: analytics.last_viewed_at(),
        }
    }
}

/// Result of recording a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutcome {
    /// False when the view fell inside the de-duplication window.
    pub counted: bool,
    pub analytics: Option<AnalyticsDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessDto {
    pub id: BusinessId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub category: BusinessCategory,
    pub status: BusinessStatus,
    pub is_verified: bool,
    pub address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub services: Vec<String>,
    pub images: Vec<BusinessImage>,
    pub primary_image_id: Option<ImageId>,
}

impl From<&Business> for BusinessDto {
    fn from(business: &Business) -> Self {
        let contact = business.contact_info();
        Self {
            id: business.id(),
            owner_id: business.owner_id(),
            name: business.profile().name().to_string(),
            description: business.profile().description().to_string(),
            category: business.category(),
            status: business.status(),
            is_verified: business.is_verified(),
            address: business.location().address().to_string(),
            email: contact.email().map(ToString::to_string),
            phone: contact.phone().map(ToString::to_string),
            website: contact.website().map(ToString::to_string),
            services: business
                .services()
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            images: business.images().to_vec(),
            primary_image_id: business.primary_image().map(|image| image.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeDto {
    pub id: BadgeId,
    pub name: String,
    pub image_url: String,
    pub placements: BadgePlacements,
    pub display_order: i32,
    pub is_active: bool,
    pub is_system: bool,
    pub created_by: Option<UserId>,
}

impl From<&Badge> for BadgeDto {
    fn from(badge: &Badge) -> Self {
        Self {
            id: badge.id(),
            name: badge.name().to_string(),
            image_url: badge.image_url().to_string(),
            placements: *badge.placements(),
            display_order: badge.display_order(),
            is_active: badge.is_active(),
            is_system: badge.is_system(),
            created_by: badge.created_by(),
        }
    }
}

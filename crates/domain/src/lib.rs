//! Domain layer for the community platform.
//!
//! This crate provides:
//! - Self-validating value objects built through `create` factories
//! - The [`AggregateRoot`] and [`DomainEvent`] abstractions with an
//!   outbox-style event list drained after commit
//! - Aggregates: newsletters, community events with sign-up lists, event
//!   analytics, businesses and badges
//!
//! Every mutation returns an [`Outcome`](common::Outcome) and leaves the
//! aggregate untouched when it fails.

pub mod analytics;
pub mod badge;
pub mod business;
pub mod entity;
pub mod event;
pub mod newsletter;
pub mod value_objects;

pub use analytics::{AnalyticsDomainEvent, AnalyticsError, DedupWindow, EventAnalytics, ViewRecord, ViewerKey};
pub use badge::{Badge, BadgeDomainEvent, BadgeError};
pub use business::{
    Business, BusinessCategory, BusinessDomainEvent, BusinessError, BusinessImage,
    BusinessProfile, BusinessStatus, Service,
};
pub use entity::{AggregateRoot, DomainEvent, DomainEvents, EntityMeta};
pub use event::{
    Commitment, Event, EventCategory, EventDetails, EventDomainEvent, EventError, EventImage,
    EventStatus, ItemCategory, NewSignUpItem, Registration, SignUpCategories, SignUpError,
    SignUpItem, SignUpList, SignUpType,
};
pub use newsletter::{
    Newsletter, NewsletterAudience, NewsletterDomainEvent, NewsletterError, NewsletterStatus,
};

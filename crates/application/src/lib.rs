//! Application layer for the community platform.
//!
//! Handlers turn commands into domain calls: validate, load, authorize the
//! acting [`Principal`], mutate, commit once through a unit of work, then
//! dispatch the drained domain events. Outbound collaborators (blob storage,
//! email, recipient lookup) sit behind traits with in-memory implementations.

pub mod commands;
pub mod context;
pub mod dispatch;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;

pub use commands::{
    AddressInput, BusinessImageInput, ContactInput, CreateBadge, CreateBusiness,
    CreateSignUpList, EventInput, ImageUpload, NewsletterInput, RecordView, UpdateBadge,
};
pub use context::{Clock, FixedClock, HandlerContext, HandlerSettings, Principal, SystemClock};
pub use dispatch::{
    DomainEventDispatcher, DomainEventHandler, EventBus, InMemoryEventLog, PublishedEvent,
};
pub use dto::{AnalyticsDto, BadgeDto, BusinessDto, EventDto, NewsletterDto, SendReport, ViewOutcome};
pub use error::{ApplicationError, CollaboratorError, Result};
pub use handlers::{BadgeHandlers, BusinessHandlers, EventHandlers, NewsletterHandlers};

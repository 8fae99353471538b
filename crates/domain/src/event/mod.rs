//! Community event aggregate and related types.

mod aggregate;
mod events;
mod sign_up;
mod status;

pub use aggregate::{Event, EventDetails, EventImage, Registration};
pub use events::EventDomainEvent;
pub use sign_up::{
    Commitment, ItemCategory, NewSignUpItem, SignUpCategories, SignUpError, SignUpItem,
    SignUpList, SignUpType,
};
pub use status::{EventCategory, EventStatus};

use common::{DomainError, ErrorKind, Failure};
use thiserror::Error;

/// Errors that can occur during event operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Organizer ID is required")]
    OrganizerRequired,

    #[error("Start date cannot be in the past")]
    StartInPast,

    #[error("Capacity must be greater than 0")]
    InvalidCapacity,

    #[error("Only draft events can be updated")]
    UpdateRequiresDraft,

    #[error("Event is already published")]
    AlreadyPublished,

    #[error("Only draft events can be published")]
    PublishRequiresDraft,

    #[error("Only published events can be cancelled")]
    CancelRequiresPublished,

    #[error("Only published events can be postponed")]
    PostponeRequiresPublished,

    #[error("{0} reason is required")]
    ReasonRequired(&'static str),

    #[error("Cannot register for unpublished event")]
    NotPublished,

    #[error("User is already registered for this event")]
    AlreadyRegistered,

    #[error("User is not registered for this event")]
    NotRegistered,

    #[error("Event is at full capacity")]
    AtCapacity,

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Cannot reduce capacity below current registrations")]
    CapacityBelowRegistrations,

    #[error("Image URL cannot be empty")]
    ImageUrlRequired,

    #[error("Blob name cannot be empty")]
    BlobNameRequired,

    #[error("An event cannot have more than {0} images")]
    TooManyImages(usize),

    #[error("Image not found")]
    ImageNotFound,

    #[error("A sign-up list with category '{0}' already exists")]
    DuplicateSignUpCategory(String),

    #[error("Sign-up list not found")]
    SignUpListNotFound,

    #[error("Cannot remove sign-up list with existing commitments")]
    SignUpListHasCommitments,

    #[error("Only draft or cancelled events can be deleted")]
    DeleteRequiresDraftOrCancelled,
}

impl EventError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventError::OrganizerRequired
            | EventError::StartInPast
            | EventError::InvalidCapacity
            | EventError::ReasonRequired(_)
            | EventError::InvalidQuantity
            | EventError::ImageUrlRequired
            | EventError::BlobNameRequired => ErrorKind::Validation,
            EventError::ImageNotFound | EventError::SignUpListNotFound => ErrorKind::NotFound,
            EventError::AlreadyRegistered | EventError::DuplicateSignUpCategory(_) => {
                ErrorKind::Conflict
            }
            _ => ErrorKind::DomainRule,
        }
    }
}

impl From<EventError> for Failure {
    fn from(err: EventError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}

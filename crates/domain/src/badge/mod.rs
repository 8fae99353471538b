//! Event badge aggregate.

mod aggregate;

pub use aggregate::{Badge, BadgeDomainEvent};

use common::{DomainError, ErrorKind, Failure};
use thiserror::Error;

/// Errors that can occur during badge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgeError {
    #[error("Badge image URL is required")]
    ImageUrlRequired,

    #[error("Badge blob name is required")]
    BlobNameRequired,

    #[error("Display order must be non-negative")]
    NegativeDisplayOrder,

    #[error("Creator user ID is required")]
    CreatorRequired,

    /// System badges are seeded and keep their identity.
    #[error("System badges cannot have their name, position, or display order modified")]
    SystemBadgeImmutable,

    #[error("System badges cannot be deleted")]
    SystemBadgeNotDeletable,

    #[error("Badge is already active")]
    AlreadyActive,

    #[error("Badge is already inactive")]
    AlreadyInactive,
}

impl BadgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BadgeError::ImageUrlRequired
            | BadgeError::BlobNameRequired
            | BadgeError::NegativeDisplayOrder
            | BadgeError::CreatorRequired => ErrorKind::Validation,
            _ => ErrorKind::DomainRule,
        }
    }
}

impl From<BadgeError> for Failure {
    fn from(err: BadgeError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}

impl From<BadgeError> for DomainError {
    fn from(err: BadgeError) -> Self {
        DomainError::new(err.kind(), err.to_string())
    }
}

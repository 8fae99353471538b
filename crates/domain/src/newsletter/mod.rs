//! Newsletter aggregate and related types.

mod aggregate;
mod audience;
mod events;
mod status;

pub use aggregate::Newsletter;
pub use audience::NewsletterAudience;
pub use events::NewsletterDomainEvent;
pub use status::NewsletterStatus;

use common::{DomainError, ErrorKind, Failure};
use thiserror::Error;

/// Errors that can occur during newsletter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NewsletterError {
    /// Creator is required.
    #[error("Creator ID is required")]
    CreatorRequired,

    /// Nobody would receive the newsletter.
    #[error("Newsletter must have at least one email group or include newsletter subscribers")]
    NoRecipients,

    /// Subscribers are included but no location is targeted.
    #[error("Select at least one metro area or target all locations")]
    NoLocationTarget,

    /// Publishing a newsletter that is already live.
    #[error("Newsletter is already active")]
    AlreadyActive,

    /// Unpublishing after emails went out.
    #[error("Cannot unpublish a newsletter after it has been sent")]
    UnpublishAfterSend,

    /// Sending a newsletter a second time.
    #[error("Newsletter has already been sent")]
    AlreadySent,

    /// Deactivating before the expiry date.
    #[error("Newsletter has not expired yet")]
    NotExpired,

    /// Deleting a newsletter that is no longer a draft.
    #[error("Only draft newsletters can be deleted")]
    DeleteRequiresDraft,

    /// Any other transition missing from the lifecycle.
    #[error("Invalid state transition: cannot {action} a newsletter in {current_state} state")]
    InvalidStateTransition {
        current_state: NewsletterStatus,
        action: &'static str,
    },
}

impl NewsletterError {
    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NewsletterError::CreatorRequired
            | NewsletterError::NoRecipients
            | NewsletterError::NoLocationTarget => ErrorKind::Validation,
            _ => ErrorKind::DomainRule,
        }
    }
}

impl From<NewsletterError> for Failure {
    fn from(err: NewsletterError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}

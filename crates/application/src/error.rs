//! Application error types.

use common::{Cancelled, ErrorKind, Failure};
use persistence::PersistenceError;
use thiserror::Error;

/// A collaborator (blob storage, email, directory) could not do its job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service} failed: {message}")]
pub struct CollaboratorError {
    pub service: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

/// Errors returned by application handlers.
///
/// Expected failures stay in [`ApplicationError::Failure`]; everything else
/// is infrastructure and is never folded into a domain failure.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Validation, rule, not-found, permission or conflict failure.
    #[error("{0}")]
    Failure(#[from] Failure),

    /// The store could not load or commit.
    #[error("Persistence error: {0}")]
    Persistence(PersistenceError),

    /// An outbound collaborator failed.
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// The caller cancelled the operation.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl ApplicationError {
    /// Returns the failure kind for expected failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApplicationError::Failure(failure) => Some(failure.kind()),
            _ => None,
        }
    }

    /// Returns the domain failure, if this is one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ApplicationError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Short label used for the outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApplicationError::Failure(_) => "rejected",
            ApplicationError::Cancelled(_) => "cancelled",
            ApplicationError::Persistence(_) | ApplicationError::Collaborator(_) => "error",
        }
    }
}

impl From<PersistenceError> for ApplicationError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Cancelled(cancelled) => ApplicationError::Cancelled(cancelled),
            other => ApplicationError::Persistence(other),
        }
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_persistence_maps_to_cancelled() {
        let err: ApplicationError = PersistenceError::Cancelled(Cancelled).into();
        assert!(matches!(err, ApplicationError::Cancelled(_)));
        assert_eq!(err.outcome(), "cancelled");
    }

    #[test]
    fn test_infrastructure_has_no_kind() {
        let err: ApplicationError = PersistenceError::Unavailable("down".into()).into();
        assert!(err.kind().is_none());
        assert!(err.failure().is_none());

        let err: ApplicationError = Failure::not_found("Event not found").into();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }
}

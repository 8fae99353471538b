//! Error taxonomy shared by the domain and application layers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of an expected (non-infrastructure) failure.
///
/// The API boundary resolves each kind to a status code through a single
/// mapping table, so new kinds must be added there as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input rejected before any I/O.
    Validation,

    /// A business rule refused the operation.
    DomainRule,

    /// The addressed resource does not exist.
    NotFound,

    /// The acting principal may not perform the operation.
    Forbidden,

    /// The resource changed underneath the caller or already exists.
    Conflict,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::DomainRule => "DomainRule",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::Conflict => "Conflict",
        }
    }

    /// Rank used to pick the kind reported for a failure carrying several
    /// errors. Higher wins.
    fn precedence(&self) -> u8 {
        match self {
            ErrorKind::NotFound => 4,
            ErrorKind::Forbidden => 3,
            ErrorKind::Conflict => 2,
            ErrorKind::DomainRule => 1,
            ErrorKind::Validation => 0,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One human-readable error with its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
}

impl DomainError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn rule(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DomainRule, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failed outcome: an ordered, non-empty list of errors.
///
/// There is no way to build an empty `Failure`, which is what keeps
/// "failed without errors" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct Failure {
    errors: Vec<DomainError>,
}

impl Failure {
    /// Creates a failure carrying a single error.
    pub fn new(error: DomainError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Creates a failure from a list of errors.
    ///
    /// Returns `None` for an empty list.
    pub fn from_errors(errors: Vec<DomainError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DomainError::validation(message))
    }

    pub fn rule(message: impl Into<String>) -> Self {
        Self::new(DomainError::rule(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DomainError::not_found(message))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(DomainError::forbidden(message))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(DomainError::conflict(message))
    }

    /// Returns all errors in the order they were recorded.
    pub fn errors(&self) -> &[DomainError] {
        &self.errors
    }

    /// Returns the first recorded error.
    pub fn first(&self) -> &DomainError {
        &self.errors[0]
    }

    /// Returns the error messages in order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(DomainError::message).collect()
    }

    /// Returns the most significant kind among the carried errors.
    ///
    /// NotFound outranks Forbidden, which outranks Conflict, which outranks
    /// the rule and validation kinds.
    pub fn kind(&self) -> ErrorKind {
        self.errors
            .iter()
            .map(DomainError::kind)
            .max_by_key(ErrorKind::precedence)
            .unwrap_or(ErrorKind::Validation)
    }

    /// Returns true if any carried error has the given kind.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// Returns true if any carried message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.message().contains(needle))
    }

    /// Appends the errors of another failure.
    pub fn merge(mut self, other: Failure) -> Self {
        self.errors.extend(other.errors);
        self
    }

    /// Consumes the failure and returns its errors.
    pub fn into_errors(self) -> Vec<DomainError> {
        self.errors
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        Failure::new(error)
    }
}

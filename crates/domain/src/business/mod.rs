//! Business directory aggregate and related types.

mod aggregate;
mod profile;

pub use aggregate::{Business, BusinessDomainEvent, BusinessImage};
pub use profile::{BusinessProfile, Service};

use common::{DomainError, ErrorKind, Failure};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during business operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessError {
    #[error("Owner ID is required")]
    OwnerRequired,

    #[error("Business is already active")]
    AlreadyActive,

    #[error("Business is already suspended")]
    AlreadySuspended,

    #[error("Business is already verified")]
    AlreadyVerified,

    #[error("Business is not verified")]
    NotVerified,

    #[error("Service with this name already exists")]
    DuplicateService,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Image URL cannot be empty")]
    ImageUrlRequired,

    #[error("An image with this URL already exists")]
    DuplicateImage,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Image is already set as primary")]
    AlreadyPrimary,
}

impl BusinessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusinessError::OwnerRequired | BusinessError::ImageUrlRequired => ErrorKind::Validation,
            BusinessError::ServiceNotFound | BusinessError::ImageNotFound => ErrorKind::NotFound,
            BusinessError::DuplicateService | BusinessError::DuplicateImage => ErrorKind::Conflict,
            _ => ErrorKind::DomainRule,
        }
    }
}

impl From<BusinessError> for Failure {
    fn from(err: BusinessError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}

/// Moderation state of a business listing.
///
/// ```text
/// PendingApproval ──activate──► Active ◄──activate── Suspended
///                                 │                      ▲
///                                 └───────suspend────────┘
/// any ──deactivate──► Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessStatus {
    PendingApproval,
    Active,
    Suspended,
    Inactive,
}

impl BusinessStatus {
    pub fn is_listed(&self) -> bool {
        matches!(self, BusinessStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStatus::PendingApproval => "PendingApproval",
            BusinessStatus::Active => "Active",
            BusinessStatus::Suspended => "Suspended",
            BusinessStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directory category a business is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessCategory {
    Restaurant,
    Grocery,
    Retail,
    Services,
    Healthcare,
    Education,
    Professional,
    Entertainment,
    Other,
}

impl BusinessCategory {
    /// Parses a category name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let category = match value.trim().to_ascii_lowercase().as_str() {
            "restaurant" => BusinessCategory::Restaurant,
            "grocery" => BusinessCategory::Grocery,
            "retail" => BusinessCategory::Retail,
            "services" => BusinessCategory::Services,
            "healthcare" => BusinessCategory::Healthcare,
            "education" => BusinessCategory::Education,
            "professional" => BusinessCategory::Professional,
            "entertainment" => BusinessCategory::Entertainment,
            "other" => BusinessCategory::Other,
            _ => return None,
        };
        Some(category)
    }
}

//! Shared building blocks for the community platform.
//!
//! - Typed identifiers and the aggregate [`Version`]
//! - The [`Outcome`] result contract with its non-empty [`Failure`]
//! - The [`ErrorKind`] taxonomy resolved at the HTTP boundary
//! - Validation helpers for value objects and command validators
//! - A cooperative [`CancellationToken`]

pub mod cancel;
pub mod error;
pub mod outcome;
pub mod types;
pub mod validation;

pub use cancel::{CancellationToken, Cancelled};
pub use error::{DomainError, ErrorKind, Failure};
pub use outcome::{Outcome, OutcomeExt, success};
pub use types::{
    AnalyticsId, BadgeId, BusinessId, EmailGroupId, EventId, ImageId, MetroAreaId, NewsletterId,
    SignUpItemId, SignUpListId, UserId, Version,
};
pub use validation::{ValueObject, Validator, in_range, max_length, optional_text, required_text};

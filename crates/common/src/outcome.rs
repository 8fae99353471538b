//! The result contract returned by every domain operation and handler.
//!
//! An [`Outcome`] is a plain `Result` whose error side is a non-empty
//! [`Failure`]. Success never carries errors and failure always carries at
//! least one, so the two states cannot be mixed. Chaining with `?` gives
//! fail-fast propagation; batch validation goes through
//! [`Validator`](crate::Validator) instead.

use crate::error::{DomainError, Failure};

/// Outcome of an operation that can fail for expected reasons.
pub type Outcome<T = ()> = std::result::Result<T, Failure>;

/// Returns a successful unit outcome.
pub fn success() -> Outcome {
    Ok(())
}

/// Vocabulary helpers on top of [`Outcome`].
pub trait OutcomeExt<T> {
    /// Returns true on success.
    fn is_success(&self) -> bool;

    /// Returns true on failure.
    fn is_failure(&self) -> bool;

    /// Returns the carried errors; empty exactly when successful.
    fn errors(&self) -> &[DomainError];

    /// Returns the carried error messages.
    fn messages(&self) -> Vec<&str>;

    /// Returns the success value.
    ///
    /// # Panics
    ///
    /// Panics when called on a failure. Reading the value of a failed outcome
    /// is a caller bug, not a domain failure.
    fn value(&self) -> &T;

    /// Consumes the outcome and returns the success value.
    ///
    /// # Panics
    ///
    /// Panics when called on a failure.
    fn into_value(self) -> T;
}

impl<T> OutcomeExt<T> for Outcome<T> {
    fn is_success(&self) -> bool {
        self.is_ok()
    }

    fn is_failure(&self) -> bool {
        self.is_err()
    }

    fn errors(&self) -> &[DomainError] {
        match self {
            Ok(_) => &[],
            Err(failure) => failure.errors(),
        }
    }

    fn messages(&self) -> Vec<&str> {
        self.errors().iter().map(DomainError::message).collect()
    }

    fn value(&self) -> &T {
        match self {
            Ok(value) => value,
            Err(failure) => panic!("value accessed on a failed outcome: {failure}"),
        }
    }

    fn into_value(self) -> T {
        match self {
            Ok(value) => value,
            Err(failure) => panic!("value accessed on a failed outcome: {failure}"),
        }
    }
}

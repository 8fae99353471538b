//! Validation helpers used by value-object factories and command validators.

use std::fmt::Display;

use crate::error::{DomainError, Failure};
use crate::outcome::Outcome;

/// Marker for immutable, structurally-equal types built through a validating
/// factory.
pub trait ValueObject: Clone + PartialEq + std::fmt::Debug + Send + Sync {}

/// Trims `value` and checks it is non-empty and at most `max` characters.
///
/// `label` is the human name used in messages, e.g. `"Event title"` yields
/// `"Event title is required"`.
pub fn required_text(value: &str, label: &str, max: usize) -> Outcome<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Failure::validation(format!("{label} is required")));
    }
    max_length(trimmed, label, max)?;
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but an absent or blank value yields `None`.
pub fn optional_text(value: Option<&str>, label: &str, max: usize) -> Outcome<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            max_length(trimmed, label, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Checks that `value` has at most `max` characters.
pub fn max_length(value: &str, label: &str, max: usize) -> Outcome {
    if value.chars().count() > max {
        return Err(Failure::validation(format!(
            "{label} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

/// Checks that `value` lies in `min..=max`.
pub fn in_range<T>(value: T, min: T, max: T, label: &str) -> Outcome<T>
where
    T: PartialOrd + Display + Copy,
{
    // NaN compares false both ways and is rejected here too.
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(Failure::validation(format!(
            "{label} must be between {min} and {max}"
        )))
    }
}

/// Accumulates validation errors so edge validators can report every
/// violated rule at once instead of stopping at the first.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<DomainError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a validation error when `condition` is false.
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(DomainError::validation(message));
        }
        self
    }

    /// Records an arbitrary error.
    pub fn push(&mut self, error: DomainError) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Keeps the value of a successful outcome and records the errors of a
    /// failed one.
    pub fn collect<T>(&mut self, outcome: Outcome<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(failure) => {
                self.errors.extend(failure.into_errors());
                None
            }
        }
    }

    /// Returns true if no error has been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finishes validation.
    pub fn finish(self) -> Outcome {
        match Failure::from_errors(self.errors) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Finishes validation and builds the value only when everything passed.
    pub fn finish_with<T>(self, build: impl FnOnce() -> T) -> Outcome<T> {
        self.finish().map(|()| build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::outcome::OutcomeExt;

    #[test]
    fn test_required_text_trims() {
        let value = required_text("  Summer Fair  ", "Event title", 200).unwrap();
        assert_eq!(value, "Summer Fair");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        let outcome = required_text("   ", "Event title", 200);
        assert_eq!(outcome.messages(), vec!["Event title is required"]);
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_required_text_counts_chars_not_bytes() {
        let accented = "é".repeat(10);
        assert!(required_text(&accented, "Name", 10).is_ok());
        let outcome = required_text(&"é".repeat(11), "Name", 10);
        assert_eq!(outcome.messages(), vec!["Name cannot exceed 10 characters"]);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None, "Notes", 5).unwrap(), None);
        assert_eq!(optional_text(Some("  "), "Notes", 5).unwrap(), None);
        assert_eq!(
            optional_text(Some(" ok "), "Notes", 5).unwrap(),
            Some("ok".to_string())
        );
        assert!(optional_text(Some("too long"), "Notes", 5).is_err());
    }

    #[test]
    fn test_in_range() {
        assert_eq!(in_range(0.5, 0.0, 1.0, "Position").unwrap(), 0.5);
        assert!(in_range(1.5, 0.0, 1.0, "Position").is_err());
        assert!(in_range(f64::NAN, 0.0, 1.0, "Position").is_err());
    }

    #[test]
    fn test_validator_accumulates() {
        let mut validator = Validator::new();
        validator
            .check(false, "Title is required")
            .check(true, "never recorded")
            .check(false, "Capacity must be greater than 0");
        let outcome = validator.finish();
        assert_eq!(
            outcome.messages(),
            vec!["Title is required", "Capacity must be greater than 0"]
        );
    }

    #[test]
    fn test_validator_finish_with_builds_only_on_success() {
        let mut validator = Validator::new();
        let title = validator.collect(required_text("Fair", "Title", 10));
        assert!(validator.is_valid());
        let built = validator.finish_with(|| title.unwrap_or_default()).unwrap();
        assert_eq!(built, "Fair");
    }
}

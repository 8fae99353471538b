//! Bounded text value objects.

use common::{Outcome, ValueObject, required_text};
use serde::{Deserialize, Serialize};

/// Declares a trimmed, non-empty, length-bounded text value object.
macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $label:literal, $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Maximum length in characters.
            pub const MAX_LENGTH: usize = $max;

            /// Validates and trims `value`.
            pub fn create(value: &str) -> Outcome<Self> {
                required_text(value, $label, Self::MAX_LENGTH).map(Self)
            }

            /// Returns the text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ValueObject for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

bounded_text!(
    /// Title of a community event, 1 to 200 characters.
    EventTitle,
    "Event title",
    200
);
bounded_text!(
    /// Description of a community event, 1 to 2000 characters.
    EventDescription,
    "Event description",
    2000
);
bounded_text!(
    /// Newsletter title, 1 to 200 characters.
    NewsletterTitle,
    "Newsletter title",
    200
);
bounded_text!(
    /// Newsletter body, 1 to 5000 characters.
    NewsletterDescription,
    "Newsletter description",
    5000
);
bounded_text!(
    /// Badge display name, 1 to 50 characters.
    BadgeName,
    "Badge name",
    50
);

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    #[test]
    fn test_event_title_boundaries() {
        assert!(EventTitle::create("A").is_ok());
        assert!(EventTitle::create(&"x".repeat(200)).is_ok());

        let too_long = EventTitle::create(&"x".repeat(201));
        assert_eq!(
            too_long.messages(),
            vec!["Event title cannot exceed 200 characters"]
        );
        assert_eq!(EventTitle::create("").messages(), vec!["Event title is required"]);
    }

    #[test]
    fn test_event_description_boundaries() {
        assert!(EventDescription::create(&"d".repeat(2000)).is_ok());
        assert!(EventDescription::create(&"d".repeat(2001)).is_err());
    }

    #[test]
    fn test_created_value_is_normalized_input() {
        let title = EventTitle::create("  Vesak Lantern Night ").unwrap();
        assert_eq!(title.as_str(), "Vesak Lantern Night");
    }

    #[test]
    fn test_create_is_idempotent() {
        let a = NewsletterTitle::create("Weekly digest").unwrap();
        let b = NewsletterTitle::create("Weekly digest").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_badge_name_limit() {
        assert!(BadgeName::create(&"b".repeat(50)).is_ok());
        assert_eq!(
            BadgeName::create(&"b".repeat(51)).messages(),
            vec!["Badge name cannot exceed 50 characters"]
        );
    }
}

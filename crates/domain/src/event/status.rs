//! Community event lifecycle states.

use serde::{Deserialize, Serialize};

/// The state of a community event.
///
/// State transitions:
/// ```text
/// Draft ──► Published ──┬──► Completed
///                │  ▲   │
///                │  └── Postponed
///                └──────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Postponed,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn can_update_details(&self) -> bool {
        matches!(self, EventStatus::Draft)
    }

    pub fn can_publish(&self) -> bool {
        matches!(self, EventStatus::Draft | EventStatus::Postponed)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, EventStatus::Published | EventStatus::Postponed)
    }

    pub fn can_postpone(&self) -> bool {
        matches!(self, EventStatus::Published)
    }

    pub fn accepts_registrations(&self) -> bool {
        matches!(self, EventStatus::Published)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, EventStatus::Draft | EventStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draft",
            EventStatus::Published => "Published",
            EventStatus::Postponed => "Postponed",
            EventStatus::Cancelled => "Cancelled",
            EventStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of gathering an event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventCategory {
    #[default]
    Community,
    Cultural,
    Religious,
    Business,
    Educational,
    Social,
    Charity,
    Entertainment,
}

impl EventCategory {
    /// Parses a category name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let category = match value.trim().to_ascii_lowercase().as_str() {
            "community" => EventCategory::Community,
            "cultural" => EventCategory::Cultural,
            "religious" => EventCategory::Religious,
            "business" => EventCategory::Business,
            "educational" => EventCategory::Educational,
            "social" => EventCategory::Social,
            "charity" => EventCategory::Charity,
            "entertainment" => EventCategory::Entertainment,
            _ => return None,
        };
        Some(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_draft_details_are_editable() {
        assert!(EventStatus::Draft.can_update_details());
        assert!(!EventStatus::Published.can_update_details());
        assert!(!EventStatus::Cancelled.can_update_details());
    }

    #[test]
    fn test_registrations_need_published() {
        assert!(EventStatus::Published.accepts_registrations());
        assert!(!EventStatus::Draft.accepts_registrations());
        assert!(!EventStatus::Postponed.accepts_registrations());
    }

    #[test]
    fn test_deletable_states() {
        assert!(EventStatus::Draft.can_delete());
        assert!(EventStatus::Cancelled.can_delete());
        assert!(!EventStatus::Published.can_delete());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(EventCategory::parse("Cultural"), Some(EventCategory::Cultural));
        assert_eq!(EventCategory::parse(" charity "), Some(EventCategory::Charity));
        assert_eq!(EventCategory::parse("sports"), None);
    }
}

//! Newsletter lifecycle states.

use serde::{Deserialize, Serialize};

/// The state of a newsletter.
///
/// State transitions:
/// ```text
///            publish               expire
/// Draft ─────────────► Active ─────────────► Inactive
///   ▲                  │    ▲                  │
///   └──── unpublish ───┘    └─── reactivate ───┘
///        (not sent)
/// ```
///
/// "Sent" is not a state: sending stamps `sent_at` and the newsletter stays
/// Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NewsletterStatus {
    /// Being written; editable and deletable.
    #[default]
    Draft,

    /// Published and visible until it expires.
    Active,

    /// Expired; may be reactivated.
    Inactive,
}

impl NewsletterStatus {
    pub fn can_update(&self) -> bool {
        matches!(self, NewsletterStatus::Draft)
    }

    pub fn can_publish(&self) -> bool {
        matches!(self, NewsletterStatus::Draft)
    }

    pub fn can_unpublish(&self) -> bool {
        matches!(self, NewsletterStatus::Active)
    }

    pub fn can_send(&self) -> bool {
        matches!(self, NewsletterStatus::Active)
    }

    pub fn can_deactivate(&self) -> bool {
        matches!(self, NewsletterStatus::Active)
    }

    pub fn can_reactivate(&self) -> bool {
        matches!(self, NewsletterStatus::Inactive)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, NewsletterStatus::Draft)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterStatus::Draft => "Draft",
            NewsletterStatus::Active => "Active",
            NewsletterStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for NewsletterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Self-validating value objects.
//!
//! Every type here is immutable, compares by value and can only be built
//! through its `create` factory, so a live instance is always valid.

mod badge_location;
mod contact;
mod location;
mod money;
mod schedule;
mod text;

pub use badge_location::{BadgeLocationConfig, BadgePlacements};
pub use contact::{ContactInformation, Email, PhoneNumber, WebsiteUrl};
pub use location::{Address, BusinessLocation, GeoCoordinate};
pub use money::{Currency, Money};
pub use schedule::DateRange;
pub use text::{BadgeName, EventDescription, EventTitle, NewsletterDescription, NewsletterTitle};

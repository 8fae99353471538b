//! Handler inputs.
//!
//! Commands carry primitives straight from the boundary. Each one validates
//! itself into value objects before any I/O happens, collecting every
//! problem it finds rather than stopping at the first.

use chrono::{DateTime, Utc};
use common::{EmailGroupId, EventId, Failure, MetroAreaId, Outcome, UserId, Validator};
use domain::value_objects::{
    Address, BadgePlacements, BusinessLocation, ContactInformation, DateRange, EventDescription,
    EventTitle, GeoCoordinate, Money, NewsletterDescription, NewsletterTitle,
};
use domain::{
    BusinessCategory, BusinessProfile, EventCategory, EventDetails, NewSignUpItem,
    NewsletterAudience, SignUpCategories, SignUpList, SignUpType,
};
use serde::Deserialize;

/// Newsletter content and audience, used to create and to update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsletterInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub email_group_ids: Vec<EmailGroupId>,
    #[serde(default)]
    pub include_newsletter_subscribers: bool,
    #[serde(default)]
    pub metro_area_ids: Vec<MetroAreaId>,
    #[serde(default)]
    pub target_all_locations: bool,
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub is_announcement_only: bool,
}

/// A validated [`NewsletterInput`].
#[derive(Debug)]
pub(crate) struct NewsletterFields {
    pub title: NewsletterTitle,
    pub description: NewsletterDescription,
    pub audience: NewsletterAudience,
}

impl NewsletterInput {
    pub(crate) fn validate(&self) -> Outcome<NewsletterFields> {
        let mut validator = Validator::new();
        let title = validator.collect(NewsletterTitle::create(&self.title));
        let description = validator.collect(NewsletterDescription::create(&self.description));
        let audience = validator.collect(NewsletterAudience::create(
            self.email_group_ids.clone(),
            self.include_newsletter_subscribers,
            self.metro_area_ids.clone(),
            self.target_all_locations,
        ));
        validator.finish()?;

        match (title, description, audience) {
            (Some(title), Some(description), Some(audience)) => Ok(NewsletterFields {
                title,
                description,
                audience,
            }),
            _ => Err(Failure::validation("Newsletter input is incomplete")),
        }
    }
}

/// Event details as entered by the organizer.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub capacity: u32,
    pub category: String,
    /// Ticket price in minor units; free when absent.
    pub ticket_price_minor: Option<i64>,
    pub currency: Option<String>,
}

impl EventInput {
    pub(crate) fn validate(&self) -> Outcome<EventDetails> {
        let mut validator = Validator::new();
        let title = validator.collect(EventTitle::create(&self.title));
        let description = validator.collect(EventDescription::create(&self.description));
        let schedule = validator.collect(DateRange::create(self.start_date, self.end_date));
        let category = EventCategory::parse(&self.category);
        validator.check(
            category.is_some(),
            format!("Unknown event category: {}", self.category.trim()),
        );
        let ticket_price = match self.ticket_price_minor {
            Some(amount) => validator
                .collect(Money::create(amount, self.currency.as_deref().unwrap_or("USD")))
                .map(Some),
            None => Some(None),
        };
        validator.finish()?;

        match (title, description, schedule, category, ticket_price) {
            (Some(title), Some(description), Some(schedule), Some(category), Some(ticket_price)) => {
                Ok(EventDetails {
                    title,
                    description,
                    schedule,
                    capacity: self.capacity,
                    category,
                    ticket_price,
                })
            }
            _ => Err(Failure::validation("Event details are incomplete")),
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Largest accepted upload.
    pub const MAX_BYTES: usize = 10 * 1024 * 1024;

    pub(crate) fn validate(&self) -> Outcome {
        let mut validator = Validator::new();
        validator.check(!self.file_name.trim().is_empty(), "File name is required");
        validator.check(!self.data.is_empty(), "Image file is required");
        validator.check(
            self.data.len() <= Self::MAX_BYTES,
            "Image file cannot exceed 10 MB",
        );
        validator.check(
            self.content_type.starts_with("image/"),
            "Only image files are allowed",
        );
        validator.finish()
    }
}

/// A page view of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordView {
    pub event_id: EventId,
    pub user_id: Option<UserId>,
    pub ip_address: String,
}

/// Input for a new sign-up list.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSignUpList {
    pub category: String,
    pub description: Option<String>,
    pub sign_up_type: SignUpType,
    #[serde(default)]
    pub predefined_items: Vec<String>,
    #[serde(default)]
    pub categories: SignUpCategories,
    #[serde(default)]
    pub items: Vec<NewSignUpItem>,
}

impl CreateSignUpList {
    pub(crate) fn validate(&self) -> Outcome<SignUpList> {
        if self.sign_up_type != SignUpType::Categorized {
            return SignUpList::create(
                &self.category,
                self.description.as_deref(),
                self.sign_up_type,
                self.predefined_items.clone(),
            );
        }

        let mut validator = Validator::new();
        validator.check(
            self.categories.any(),
            "At least one item category must be selected",
        );
        validator.finish()?;
        SignUpList::create_with_categories_and_items(
            &self.category,
            self.description.as_deref(),
            self.categories,
            &self.items,
        )
    }
}

/// Everything needed to list a new business.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBusiness {
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub category: String,
    pub address: AddressInput,
    pub contact: ContactInput,
}

/// A postal address with optional coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Contact channels; at least one is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInput {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl ContactInput {
    pub(crate) fn validate(&self) -> Outcome<ContactInformation> {
        ContactInformation::create(
            self.email.as_deref(),
            self.phone.as_deref(),
            self.website.as_deref(),
        )
    }
}

/// A validated [`CreateBusiness`].
pub(crate) struct BusinessFields {
    pub profile: BusinessProfile,
    pub location: BusinessLocation,
    pub contact: ContactInformation,
    pub category: BusinessCategory,
}

impl CreateBusiness {
    pub(crate) fn validate(&self) -> Outcome<BusinessFields> {
        let mut validator = Validator::new();
        validator.check(!self.owner_id.is_nil(), "Owner ID cannot be empty");
        let profile = validator.collect(BusinessProfile::create(
            &self.name,
            &self.description,
            self.website.as_deref(),
            &self.services,
            &self.specializations,
        ));
        let location = validator.collect(self.address.validate());
        let contact = validator.collect(self.contact.validate());
        let category = BusinessCategory::parse(&self.category);
        validator.check(
            category.is_some(),
            format!("Unknown business category: {}", self.category.trim()),
        );
        validator.finish()?;

        match (profile, location, contact, category) {
            (Some(profile), Some(location), Some(contact), Some(category)) => Ok(BusinessFields {
                profile,
                location,
                contact,
                category,
            }),
            _ => Err(Failure::validation("Business input is incomplete")),
        }
    }
}

impl AddressInput {
    fn validate(&self) -> Outcome<BusinessLocation> {
        let mut validator = Validator::new();
        let address = validator.collect(Address::create(
            &self.street,
            &self.city,
            &self.state,
            &self.zip_code,
            &self.country,
        ));
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => validator
                .collect(GeoCoordinate::create(latitude, longitude))
                .map(Some),
            (None, None) => Some(None),
            _ => {
                validator.check(false, "Latitude and longitude must be given together");
                None
            }
        };
        validator.finish()?;

        match (address, coordinates) {
            (Some(address), Some(coordinates)) => BusinessLocation::create(address, coordinates),
            _ => Err(Failure::validation("Location is incomplete")),
        }
    }
}

/// Business image upload options.
#[derive(Debug, Clone)]
pub struct BusinessImageInput {
    pub upload: ImageUpload,
    pub alt_text: Option<String>,
    pub make_primary: bool,
}

/// A new badge with its image.
#[derive(Debug, Clone)]
pub struct CreateBadge {
    pub name: String,
    pub placements: BadgePlacements,
    pub display_order: i32,
    pub image: ImageUpload,
}

/// Badge fields that may change after creation.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBadge {
    pub name: String,
    #[serde(default)]
    pub placements: BadgePlacements,
    pub display_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_input() -> EventInput {
        let start = Utc::now() + Duration::days(3);
        EventInput {
            title: "Poya day meditation".into(),
            description: "Evening session at the temple.".into(),
            start_date: start,
            end_date: start + Duration::hours(2),
            capacity: 40,
            category: "religious".into(),
            ticket_price_minor: None,
            currency: None,
        }
    }

    #[test]
    fn test_event_input_builds_details() {
        let details = event_input().validate().unwrap();
        assert_eq!(details.category, EventCategory::Religious);
        assert!(details.ticket_price.is_none());
    }

    #[test]
    fn test_event_input_collects_every_error() {
        let input = EventInput {
            title: "  ".into(),
            category: "space".into(),
            ..event_input()
        };
        let failure = input.validate().unwrap_err();
        assert_eq!(failure.errors().len(), 2);
        assert!(failure.mentions("Unknown event category: space"));
    }

    #[test]
    fn test_newsletter_input_requires_recipients() {
        let input = NewsletterInput {
            title: "Title".into(),
            description: "Body".into(),
            ..Default::default()
        };
        let failure = input.validate().unwrap_err();
        assert!(failure.mentions("at least one email group"));
    }

    #[test]
    fn test_categorized_list_needs_a_category() {
        let command = CreateSignUpList {
            category: "Food".into(),
            description: None,
            sign_up_type: SignUpType::Categorized,
            predefined_items: vec![],
            categories: SignUpCategories::default(),
            items: vec![],
        };
        let failure = command.validate().unwrap_err();
        assert_eq!(
            failure.messages(),
            vec!["At least one item category must be selected"]
        );
    }

    #[test]
    fn test_image_upload_rules() {
        let upload = ImageUpload {
            file_name: "doc.pdf".into(),
            content_type: "application/pdf".into(),
            data: vec![],
        };
        let failure = upload.validate().unwrap_err();
        assert!(failure.mentions("Image file is required"));
        assert!(failure.mentions("Only image files are allowed"));
    }

    #[test]
    fn test_half_coordinates_rejected() {
        let address = AddressInput {
            street: "12 Main St".into(),
            city: "Columbus".into(),
            state: "OH".into(),
            zip_code: "43004".into(),
            country: "USA".into(),
            latitude: Some(40.0),
            longitude: None,
        };
        assert!(address.validate().unwrap_err().mentions("must be given together"));
    }
}

use common::{Failure, Outcome, ValueObject, Validator, optional_text, required_text};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, WebsiteUrl};

/// Public description of a business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessProfile {
    name: String,
    description: String,
    website: Option<WebsiteUrl>,
    services: Vec<String>,
    specializations: Vec<String>,
}

impl BusinessProfile {
    pub const MAX_NAME: usize = 255;
    pub const MAX_DESCRIPTION: usize = 2000;

    pub fn create(
        name: &str,
        description: &str,
        website: Option<&str>,
        services: &[String],
        specializations: &[String],
    ) -> Outcome<Self> {
        let mut validator = Validator::new();
        let name = validator.collect(required_text(name, "Business name", Self::MAX_NAME));
        let description = validator.collect(required_text(
            description,
            "Business description",
            Self::MAX_DESCRIPTION,
        ));
        let website = match website.map(str::trim).filter(|w| !w.is_empty()) {
            Some(url) => validator.collect(
                WebsiteUrl::create(url)
                    .map(Some)
                    .map_err(|_| Failure::validation("Invalid website URL format")),
            ),
            None => Some(None),
        };
        validator.finish()?;

        match (name, description, website) {
            (Some(name), Some(description), Some(website)) => Ok(Self {
                name,
                description,
                website,
                services: clean_list(services),
                specializations: clean_list(specializations),
            }),
            _ => Err(Failure::validation("Business profile is incomplete")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn website(&self) -> Option<&WebsiteUrl> {
        self.website.as_ref()
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn specializations(&self) -> &[String] {
        &self.specializations
    }
}

impl ValueObject for BusinessProfile {}

// Trimmed, blank entries dropped, first spelling of each duplicate kept.
fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(value)) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

/// A service offered by a business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    name: String,
    description: Option<String>,
    price: Option<Money>,
}

impl Service {
    pub fn create(name: &str, description: Option<&str>, price: Option<Money>) -> Outcome<Self> {
        let mut validator = Validator::new();
        let name = validator.collect(required_text(name, "Service name", 200));
        let description = validator.collect(optional_text(description, "Service description", 1000));
        validator.finish()?;

        match (name, description) {
            (Some(name), Some(description)) => Ok(Self {
                name,
                description,
                price,
            }),
            _ => Err(Failure::validation("Service is incomplete")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Option<Money> {
        self.price
    }
}

impl ValueObject for Service {}

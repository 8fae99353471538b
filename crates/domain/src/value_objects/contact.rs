//! Contact value objects: email, phone number, website and the combined
//! contact block a business publishes.

use std::sync::LazyLock;

use common::{Failure, Outcome, ValueObject, Validator};
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9(][0-9\s\-()]*[0-9]$").expect("phone pattern is valid")
});

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*(:[0-9]{1,5})?(/\S*)?$")
        .expect("url pattern is valid")
});

/// A syntactically valid, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub const MAX_LENGTH: usize = 255;

    pub fn create(value: &str) -> Outcome<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Failure::validation("Email is required"));
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(Failure::validation("Email cannot exceed 255 characters"));
        }
        if !EMAIL_PATTERN.is_match(trimmed) {
            return Err(Failure::validation("Invalid email format"));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

impl ValueObject for Email {}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A phone number with an optional leading `+` and 7 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn create(value: &str) -> Outcome<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Failure::validation("Phone number is required"));
        }
        let digits = trimmed.chars().filter(char::is_ascii_digit).count();
        if !PHONE_PATTERN.is_match(trimmed) || !(7..=15).contains(&digits) {
            return Err(Failure::validation("Invalid phone number format"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for PhoneNumber {}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An absolute `http` or `https` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebsiteUrl(String);

impl WebsiteUrl {
    pub fn create(value: &str) -> Outcome<Self> {
        let trimmed = value.trim();
        if !URL_PATTERN.is_match(trimmed) {
            return Err(Failure::validation("Website must be a valid URL"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for WebsiteUrl {}

impl std::fmt::Display for WebsiteUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Public contact details; at least one method must be present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactInformation {
    email: Option<Email>,
    phone: Option<PhoneNumber>,
    website: Option<WebsiteUrl>,
}

impl ContactInformation {
    /// Validates every provided method and reports all failures together.
    pub fn create(
        email: Option<&str>,
        phone: Option<&str>,
        website: Option<&str>,
    ) -> Outcome<Self> {
        let (email, phone, website) = (present(email), present(phone), present(website));

        if email.is_none() && phone.is_none() && website.is_none() {
            return Err(Failure::validation(
                "At least one contact method is required",
            ));
        }

        let mut validator = Validator::new();
        let email = email.and_then(|e| validator.collect(Email::create(e)));
        let phone = phone.and_then(|p| validator.collect(PhoneNumber::create(p)));
        let website = website.and_then(|w| validator.collect(WebsiteUrl::create(w)));

        validator.finish_with(|| Self {
            email,
            phone,
            website,
        })
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn website(&self) -> Option<&WebsiteUrl> {
        self.website.as_ref()
    }
}

impl ValueObject for ContactInformation {}

//! Who a newsletter goes to.

use common::{EmailGroupId, MetroAreaId, Outcome, ValueObject};
use serde::{Deserialize, Serialize};

use super::NewsletterError;

/// Recipient targeting for a newsletter.
///
/// Recipients come from email groups and, optionally, from newsletter
/// subscribers filtered by metro area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsletterAudience {
    email_group_ids: Vec<EmailGroupId>,
    include_newsletter_subscribers: bool,
    metro_area_ids: Vec<MetroAreaId>,
    target_all_locations: bool,
}

impl NewsletterAudience {
    pub fn create(
        email_group_ids: Vec<EmailGroupId>,
        include_newsletter_subscribers: bool,
        metro_area_ids: Vec<MetroAreaId>,
        target_all_locations: bool,
    ) -> Outcome<Self> {
        if email_group_ids.is_empty() && !include_newsletter_subscribers {
            return Err(NewsletterError::NoRecipients.into());
        }
        if include_newsletter_subscribers && !target_all_locations && metro_area_ids.is_empty() {
            return Err(NewsletterError::NoLocationTarget.into());
        }

        let mut email_group_ids = email_group_ids;
        email_group_ids.sort();
        email_group_ids.dedup();
        let mut metro_area_ids = metro_area_ids;
        metro_area_ids.sort();
        metro_area_ids.dedup();

        Ok(Self {
            email_group_ids,
            include_newsletter_subscribers,
            metro_area_ids,
            target_all_locations,
        })
    }

    /// Email groups only, without subscribers.
    pub fn email_groups(ids: Vec<EmailGroupId>) -> Outcome<Self> {
        Self::create(ids, false, Vec::new(), false)
    }

    pub fn email_group_ids(&self) -> &[EmailGroupId] {
        &self.email_group_ids
    }

    pub fn include_newsletter_subscribers(&self) -> bool {
        self.include_newsletter_subscribers
    }

    pub fn metro_area_ids(&self) -> &[MetroAreaId] {
        &self.metro_area_ids
    }

    pub fn target_all_locations(&self) -> bool {
        self.target_all_locations
    }
}

impl ValueObject for NewsletterAudience {}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    #[test]
    fn test_requires_some_recipients() {
        let outcome = NewsletterAudience::create(Vec::new(), false, Vec::new(), false);
        assert_eq!(
            outcome.messages(),
            vec!["Newsletter must have at least one email group or include newsletter subscribers"]
        );
    }

    #[test]
    fn test_subscribers_need_location_target() {
        let outcome = NewsletterAudience::create(Vec::new(), true, Vec::new(), false);
        assert!(outcome.unwrap_err().mentions("metro area"));

        assert!(NewsletterAudience::create(Vec::new(), true, Vec::new(), true).is_ok());
        assert!(NewsletterAudience::create(Vec::new(), true, vec![MetroAreaId::new()], false).is_ok());
    }

    #[test]
    fn test_duplicate_groups_collapse() {
        let group = EmailGroupId::new();
        let audience = NewsletterAudience::email_groups(vec![group, group]).unwrap();
        assert_eq!(audience.email_group_ids(), &[group]);
    }
}

//! Resolves a newsletter audience to email addresses.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{EmailGroupId, MetroAreaId};
use domain::NewsletterAudience;
use tokio::sync::RwLock;

use crate::error::CollaboratorError;

/// Looks up who receives a newsletter.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Returns the distinct recipient addresses, sorted.
    async fn resolve(&self, audience: &NewsletterAudience) -> Result<Vec<String>, CollaboratorError>;
}

#[derive(Debug, Default)]
struct Directory {
    groups: HashMap<EmailGroupId, Vec<String>>,
    subscribers: Vec<(String, Option<MetroAreaId>)>,
    unavailable: bool,
}

/// In-memory directory of email groups and newsletter subscribers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipientDirectory {
    directory: Arc<RwLock<Directory>>,
}

impl InMemoryRecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_group(&self, group: EmailGroupId, emails: &[&str]) {
        self.directory
            .write()
            .await
            .groups
            .insert(group, emails.iter().map(|e| e.to_string()).collect());
    }

    /// Adds a newsletter subscriber, optionally tied to a metro area.
    pub async fn add_subscriber(&self, email: &str, metro_area: Option<MetroAreaId>) {
        self.directory
            .write()
            .await
            .subscribers
            .push((email.to_string(), metro_area));
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        self.directory.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl RecipientResolver for InMemoryRecipientDirectory {
    async fn resolve(&self, audience: &NewsletterAudience) -> Result<Vec<String>, CollaboratorError> {
        let directory = self.directory.read().await;
        if directory.unavailable {
            return Err(CollaboratorError::new("recipient directory", "lookup failed"));
        }

        let mut recipients = BTreeSet::new();
        for group in audience.email_group_ids() {
            if let Some(emails) = directory.groups.get(group) {
                recipients.extend(emails.iter().cloned());
            }
        }
        if audience.include_newsletter_subscribers() {
            let targeted = |area: &Option<MetroAreaId>| {
                audience.target_all_locations()
                    || area.is_some_and(|a| audience.metro_area_ids().contains(&a))
            };
            recipients.extend(
                directory
                    .subscribers
                    .iter()
                    .filter(|(_, area)| targeted(area))
                    .map(|(email, _)| email.clone()),
            );
        }
        Ok(recipients.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_groups_and_subscribers_are_merged() {
        let directory = InMemoryRecipientDirectory::new();
        let group = EmailGroupId::new();
        let metro = MetroAreaId::new();
        directory.add_group(group, &["a@example.com", "b@example.com"]).await;
        directory.add_subscriber("b@example.com", Some(metro)).await;
        directory.add_subscriber("c@example.com", Some(metro)).await;
        directory.add_subscriber("far@example.com", Some(MetroAreaId::new())).await;

        let audience = NewsletterAudience::create(vec![group], true, vec![metro], false).unwrap();
        let recipients = directory.resolve(&audience).await.unwrap();
        assert_eq!(
            recipients,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[tokio::test]
    async fn test_all_locations_reaches_every_subscriber() {
        let directory = InMemoryRecipientDirectory::new();
        directory.add_subscriber("x@example.com", None).await;
        directory.add_subscriber("y@example.com", Some(MetroAreaId::new())).await;

        let audience = NewsletterAudience::create(vec![], true, vec![], true).unwrap();
        assert_eq!(directory.resolve(&audience).await.unwrap().len(), 2);
    }
}

//! Email service trait and in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Failure, Outcome};
use tokio::sync::RwLock;

use crate::error::CollaboratorError;

/// Sends templated emails.
///
/// The outer `Result` reports infrastructure trouble (the service is down);
/// the inner [`Outcome`] reports that this one recipient was refused.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_templated(
        &self,
        template: &str,
        recipient: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Outcome, CollaboratorError>;
}

/// An email accepted by [`InMemoryEmailService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub template: String,
    pub recipient: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct InMemoryEmailState {
    sent: Vec<SentEmail>,
    rejected: HashSet<String>,
    unavailable: bool,
}

/// In-memory email service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmailService {
    state: Arc<RwLock<InMemoryEmailState>>,
}

impl InMemoryEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends to `recipient` fail as a recipient-level failure.
    pub async fn reject_recipient(&self, recipient: &str) {
        self.state.write().await.rejected.insert(recipient.to_string());
    }

    /// Makes every send fail as an infrastructure error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.state.read().await.sent.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }
}

#[async_trait]
impl EmailService for InMemoryEmailService {
    async fn send_templated(
        &self,
        template: &str,
        recipient: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Outcome, CollaboratorError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(CollaboratorError::new("email", "mail server unreachable"));
        }
        if state.rejected.contains(recipient) {
            return Ok(Err(Failure::rule(format!(
                "Recipient {recipient} rejected the message"
            ))));
        }

        state.sent.push(SentEmail {
            template: template.to_string(),
            recipient: recipient.to_string(),
            params: params.clone(),
        });
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_recipient_is_an_outcome() {
        let email = InMemoryEmailService::new();
        email.reject_recipient("bounce@example.com").await;

        let outcome = email
            .send_templated("newsletter", "bounce@example.com", &BTreeMap::new())
            .await
            .unwrap();
        assert!(outcome.is_err());
        assert_eq!(email.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_unavailable_is_an_error() {
        let email = InMemoryEmailService::new();
        email.set_unavailable(true).await;
        assert!(
            email
                .send_templated("newsletter", "a@example.com", &BTreeMap::new())
                .await
                .is_err()
        );
    }
}

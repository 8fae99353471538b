use std::collections::BTreeMap;
use std::sync::Arc;

use common::{CancellationToken, Failure, NewsletterId};
use domain::{AggregateRoot, Event, Newsletter, NewsletterStatus};
use futures_util::{StreamExt, stream};
use persistence::{DocumentStore, Repository, UnitOfWork};

use super::{load, observe};
use crate::commands::NewsletterInput;
use crate::context::{HandlerContext, Principal};
use crate::dispatch::publish_pending;
use crate::dto::{NewsletterDto, SendReport};
use crate::error::{ApplicationError, Result};
use crate::services::{EmailService, RecipientResolver};

/// Concurrent sends per newsletter.
const SEND_CONCURRENCY: usize = 8;

/// Newsletter use cases.
pub struct NewsletterHandlers<S: DocumentStore> {
    ctx: HandlerContext<S>,
    email: Arc<dyn EmailService>,
    recipients: Arc<dyn RecipientResolver>,
}

impl<S: DocumentStore> NewsletterHandlers<S> {
    pub fn new(
        ctx: HandlerContext<S>,
        email: Arc<dyn EmailService>,
        recipients: Arc<dyn RecipientResolver>,
    ) -> Self {
        Self {
            ctx,
            email,
            recipients,
        }
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn get(&self, id: NewsletterId, cancel: &CancellationToken) -> Result<NewsletterDto> {
        observe("get_newsletter", async {
            let session = self.ctx.session();
            let newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            Ok(NewsletterDto::from(&newsletter))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<NewsletterDto>> {
        observe("list_newsletters", async {
            let newsletters: Vec<Newsletter> = self.ctx.session().list(cancel).await?;
            Ok(newsletters.iter().map(NewsletterDto::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip(self, input, cancel), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        input: NewsletterInput,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        observe("create_newsletter", async {
            let fields = input.validate()?;
            let session = self.ctx.session();
            if let Some(event_id) = input.event_id {
                let _: Event = load(&session, event_id, cancel, "Event").await?;
            }

            let mut newsletter = Newsletter::create(
                fields.title,
                fields.description,
                principal.user_id,
                fields.audience,
                input.event_id,
                input.is_announcement_only,
                self.ctx.now(),
            )?;
            session.add(&newsletter).await?;
            session.commit(cancel).await?;
            publish_pending(self.ctx.dispatcher.as_ref(), &mut newsletter).await;

            tracing::info!(newsletter_id = %newsletter.id(), "newsletter created");
            Ok(NewsletterDto::from(&newsletter))
        })
        .await
    }

    #[tracing::instrument(skip(self, input, cancel), fields(user_id = %principal.user_id))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: NewsletterId,
        input: NewsletterInput,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        observe("update_newsletter", async {
            let fields = input.validate()?;
            let session = self.ctx.session();
            let mut newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "update this newsletter")?;

            newsletter.update(
                fields.title,
                fields.description,
                fields.audience,
                input.event_id,
                input.is_announcement_only,
                self.ctx.now(),
            )?;
            self.save(&session, &mut newsletter, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn publish(
        &self,
        principal: &Principal,
        id: NewsletterId,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        observe("publish_newsletter", async {
            let session = self.ctx.session();
            let mut newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "publish this newsletter")?;

            newsletter.publish(self.ctx.now())?;
            self.save(&session, &mut newsletter, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn unpublish(
        &self,
        principal: &Principal,
        id: NewsletterId,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        observe("unpublish_newsletter", async {
            let session = self.ctx.session();
            let mut newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "unpublish this newsletter")?;

            newsletter.unpublish(self.ctx.now())?;
            self.save(&session, &mut newsletter, cancel).await
        })
        .await
    }

    /// Emails every recipient, then stamps the newsletter as sent. A
    /// newsletter is sent at most once.
    ///
    /// Delivery is best-effort per recipient: refused recipients are
    /// reported, not fatal. The send is only recorded when at least one
    /// email went out or every failure was recipient-level.
    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn send(
        &self,
        principal: &Principal,
        id: NewsletterId,
        cancel: &CancellationToken,
    ) -> Result<SendReport> {
        observe("send_newsletter", async {
            let session = self.ctx.session();
            let mut newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "send this newsletter")?;

            newsletter.mark_as_sent(self.ctx.now())?;

            cancel.check()?;
            let recipients = self.recipients.resolve(newsletter.audience()).await?;
            if recipients.is_empty() {
                return Err(Failure::rule("Newsletter has no recipients").into());
            }

            let params = BTreeMap::from([
                ("newsletter_id".to_string(), newsletter.id().to_string()),
                ("title".to_string(), newsletter.title().to_string()),
                ("description".to_string(), newsletter.description().to_string()),
            ]);
            cancel.check()?;
            let sends: Vec<_> = recipients
                .iter()
                .map(|recipient| {
                    let params = &params;
                    async move {
                        let result = self
                            .email
                            .send_templated(
                                &self.ctx.settings.newsletter_template,
                                recipient,
                                params,
                            )
                            .await;
                        (recipient, result)
                    }
                })
                .collect();
            let results: Vec<_> = stream::iter(sends)
                .buffer_unordered(SEND_CONCURRENCY)
                .collect()
                .await;

            let mut delivered = 0;
            let mut failed = Vec::new();
            let mut infrastructure_error = None;
            for (recipient, result) in results {
                match result {
                    Ok(Ok(())) => delivered += 1,
                    Ok(Err(failure)) => {
                        tracing::warn!(
                            recipient = %recipient,
                            errors = %failure,
                            "recipient refused newsletter"
                        );
                        failed.push(failure.to_string());
                    }
                    Err(e) => {
                        tracing::warn!(
                            recipient = %recipient,
                            error = %e,
                            "newsletter email failed"
                        );
                        failed.push(format!("Could not send to {recipient}"));
                        infrastructure_error.get_or_insert(e);
                    }
                }
            }
            if delivered == 0
                && let Some(e) = infrastructure_error
            {
                return Err(ApplicationError::Collaborator(e));
            }

            let dto = self.save(&session, &mut newsletter, cancel).await?;
            tracing::info!(
                newsletter_id = %newsletter.id(),
                recipients = recipients.len(),
                delivered,
                failed = failed.len(),
                "newsletter sent"
            );
            Ok(SendReport {
                newsletter: dto,
                recipients: recipients.len(),
                delivered,
                failed,
            })
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn reactivate(
        &self,
        principal: &Principal,
        id: NewsletterId,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        observe("reactivate_newsletter", async {
            let session = self.ctx.session();
            let mut newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "reactivate this newsletter")?;

            newsletter.reactivate(self.ctx.now())?;
            self.save(&session, &mut newsletter, cancel).await
        })
        .await
    }

    /// Moves every expired active newsletter to Inactive in one commit.
    ///
    /// Returns how many were deactivated.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn deactivate_expired(&self, cancel: &CancellationToken) -> Result<usize> {
        observe("deactivate_expired_newsletters", async {
            let now = self.ctx.now();
            let session = self.ctx.session();
            let newsletters: Vec<Newsletter> = session.list(cancel).await?;

            let mut expired = Vec::new();
            for mut newsletter in newsletters {
                if newsletter.status() == NewsletterStatus::Active && newsletter.is_expired(now) {
                    newsletter.deactivate(now)?;
                    session.update(&newsletter).await?;
                    expired.push(newsletter);
                }
            }
            if expired.is_empty() {
                return Ok(0);
            }

            session.commit(cancel).await?;
            for newsletter in &mut expired {
                publish_pending(self.ctx.dispatcher.as_ref(), newsletter).await;
            }
            tracing::info!(count = expired.len(), "expired newsletters deactivated");
            Ok(expired.len())
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn delete(
        &self,
        principal: &Principal,
        id: NewsletterId,
        cancel: &CancellationToken,
    ) -> Result<()> {
        observe("delete_newsletter", async {
            let session = self.ctx.session();
            let newsletter: Newsletter = load(&session, id, cancel, "Newsletter").await?;
            principal.ensure_can_manage(newsletter.created_by(), "delete this newsletter")?;

            newsletter.ensure_deletable()?;
            session.remove(&newsletter).await?;
            session.commit(cancel).await?;
            tracing::info!(newsletter_id = %id, "newsletter deleted");
            Ok(())
        })
        .await
    }

    async fn save(
        &self,
        session: &persistence::Session<S>,
        newsletter: &mut Newsletter,
        cancel: &CancellationToken,
    ) -> Result<NewsletterDto> {
        session.update(&*newsletter).await?;
        session.commit(cancel).await?;
        publish_pending(self.ctx.dispatcher.as_ref(), newsletter).await;
        Ok(NewsletterDto::from(&*newsletter))
    }
}

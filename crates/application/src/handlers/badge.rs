use std::sync::Arc;

use common::{BadgeId, CancellationToken};
use domain::{AggregateRoot, Badge};
use persistence::{DocumentStore, Repository, Session, UnitOfWork};

use super::{delete_blob_best_effort, load, observe};
use crate::commands::{CreateBadge, ImageUpload, UpdateBadge};
use crate::context::{HandlerContext, Principal};
use crate::dispatch::publish_pending;
use crate::dto::BadgeDto;
use crate::error::{ApplicationError, Result};
use crate::services::{BlobStorage, StoredBlob};

/// Badge management. Every change requires an admin.
pub struct BadgeHandlers<S: DocumentStore> {
    ctx: HandlerContext<S>,
    blobs: Arc<dyn BlobStorage>,
}

impl<S: DocumentStore> BadgeHandlers<S> {
    pub fn new(ctx: HandlerContext<S>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { ctx, blobs }
    }

    /// Lists badges by display order.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<BadgeDto>> {
        observe("list_badges", async {
            let mut badges: Vec<Badge> = self.ctx.session().list(cancel).await?;
            badges.sort_by_key(|badge| badge.display_order());
            Ok(badges.iter().map(BadgeDto::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn get(&self, id: BadgeId, cancel: &CancellationToken) -> Result<BadgeDto> {
        observe("get_badge", async {
            let badge: Badge = load(&self.ctx.session(), id, cancel, "Badge").await?;
            Ok(BadgeDto::from(&badge))
        })
        .await
    }

    #[tracing::instrument(skip(self, command, cancel), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        command: CreateBadge,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        observe("create_badge", async {
            principal.ensure_admin("create badges")?;
            command.image.validate()?;

            let blob = self.upload(&command.image, cancel).await?;
            let created = async {
                let badge = Badge::create(
                    &command.name,
                    &blob.url,
                    &blob.blob_name,
                    command.placements,
                    command.display_order,
                    principal.user_id,
                    self.ctx.now(),
                )?;
                let session = self.ctx.session();
                session.add(&badge).await?;
                session.commit(cancel).await?;
                Ok::<_, ApplicationError>(badge)
            }
            .await;

            let mut badge = match created {
                Ok(badge) => badge,
                Err(e) => {
                    self.discard(&blob.blob_name).await;
                    return Err(e);
                }
            };
            publish_pending(self.ctx.dispatcher.as_ref(), &mut badge).await;
            tracing::info!(badge_id = %badge.id(), "badge created");
            Ok(BadgeDto::from(&badge))
        })
        .await
    }

    #[tracing::instrument(skip(self, command, cancel), fields(user_id = %principal.user_id))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: BadgeId,
        command: UpdateBadge,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        observe("update_badge", async {
            principal.ensure_admin("update badges")?;
            let session = self.ctx.session();
            let mut badge: Badge = load(&session, id, cancel, "Badge").await?;

            badge.update(
                &command.name,
                command.placements,
                command.display_order,
                self.ctx.now(),
            )?;
            self.save(&session, &mut badge, cancel).await
        })
        .await
    }

    /// Replaces the badge image. The old blob is removed once the new one
    /// is committed.
    #[tracing::instrument(skip(self, image, cancel), fields(user_id = %principal.user_id))]
    pub async fn update_image(
        &self,
        principal: &Principal,
        id: BadgeId,
        image: ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        observe("update_badge_image", async {
            principal.ensure_admin("update badges")?;
            image.validate()?;
            let session = self.ctx.session();
            let mut badge: Badge = load(&session, id, cancel, "Badge").await?;

            let blob = self.upload(&image, cancel).await?;
            let replaced = async {
                let previous = badge.update_image(&blob.url, &blob.blob_name, self.ctx.now())?;
                session.update(&badge).await?;
                session.commit(cancel).await?;
                Ok::<_, ApplicationError>(previous)
            }
            .await;

            let previous = match replaced {
                Ok(previous) => previous,
                Err(e) => {
                    self.discard(&blob.blob_name).await;
                    return Err(e);
                }
            };
            publish_pending(self.ctx.dispatcher.as_ref(), &mut badge).await;
            self.discard(&previous).await;
            Ok(BadgeDto::from(&badge))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn activate(
        &self,
        principal: &Principal,
        id: BadgeId,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        observe("activate_badge", async {
            principal.ensure_admin("update badges")?;
            let session = self.ctx.session();
            let mut badge: Badge = load(&session, id, cancel, "Badge").await?;

            badge.activate(self.ctx.now())?;
            self.save(&session, &mut badge, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn deactivate(
        &self,
        principal: &Principal,
        id: BadgeId,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        observe("deactivate_badge", async {
            principal.ensure_admin("update badges")?;
            let session = self.ctx.session();
            let mut badge: Badge = load(&session, id, cancel, "Badge").await?;

            badge.deactivate(self.ctx.now())?;
            self.save(&session, &mut badge, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn delete(
        &self,
        principal: &Principal,
        id: BadgeId,
        cancel: &CancellationToken,
    ) -> Result<()> {
        observe("delete_badge", async {
            principal.ensure_admin("delete badges")?;
            let session = self.ctx.session();
            let badge: Badge = load(&session, id, cancel, "Badge").await?;
            badge.ensure_deletable()?;

            session.remove(&badge).await?;
            session.commit(cancel).await?;
            self.discard(badge.blob_name()).await;
            tracing::info!(badge_id = %id, "badge deleted");
            Ok(())
        })
        .await
    }

    async fn upload(&self, image: &ImageUpload, cancel: &CancellationToken) -> Result<StoredBlob> {
        cancel.check()?;
        let blob = self
            .blobs
            .upload(
                &self.ctx.settings.badge_image_container,
                &image.file_name,
                &image.content_type,
                &image.data,
            )
            .await?;
        Ok(blob)
    }

    async fn discard(&self, blob_name: &str) {
        delete_blob_best_effort(
            self.blobs.as_ref(),
            &self.ctx.settings.badge_image_container,
            blob_name,
        )
        .await;
    }

    async fn save(
        &self,
        session: &Session<S>,
        badge: &mut Badge,
        cancel: &CancellationToken,
    ) -> Result<BadgeDto> {
        session.update(&*badge).await?;
        session.commit(cancel).await?;
        publish_pending(self.ctx.dispatcher.as_ref(), badge).await;
        Ok(BadgeDto::from(&*badge))
    }
}

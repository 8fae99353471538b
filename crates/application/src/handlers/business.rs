use std::sync::Arc;

use common::{BusinessId, CancellationToken, ImageId};
use domain::{AggregateRoot, Business};
use persistence::{DocumentStore, Repository, Session, UnitOfWork};

use super::{delete_blob_best_effort, load, observe};
use crate::commands::{BusinessImageInput, ContactInput, CreateBusiness};
use crate::context::{HandlerContext, Principal};
use crate::dispatch::publish_pending;
use crate::dto::BusinessDto;
use crate::error::{ApplicationError, Result};
use crate::services::BlobStorage;

/// Business directory use cases.
pub struct BusinessHandlers<S: DocumentStore> {
    ctx: HandlerContext<S>,
    blobs: Arc<dyn BlobStorage>,
}

impl<S: DocumentStore> BusinessHandlers<S> {
    pub fn new(ctx: HandlerContext<S>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { ctx, blobs }
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn get(&self, id: BusinessId, cancel: &CancellationToken) -> Result<BusinessDto> {
        observe("get_business", async {
            let business: Business = load(&self.ctx.session(), id, cancel, "Business").await?;
            Ok(BusinessDto::from(&business))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<BusinessDto>> {
        observe("list_businesses", async {
            let businesses: Vec<Business> = self.ctx.session().list(cancel).await?;
            Ok(businesses.iter().map(BusinessDto::from).collect())
        })
        .await
    }

    /// Registers a business for review. Only admins may register one on
    /// behalf of another user.
    #[tracing::instrument(skip(self, command, cancel), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        command: CreateBusiness,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("create_business", async {
            let fields = command.validate()?;
            principal.ensure_can_manage(command.owner_id, "create a business for another user")?;

            let mut business = Business::create(
                fields.profile,
                fields.location,
                fields.contact,
                fields.category,
                command.owner_id,
                self.ctx.now(),
            )?;
            let session = self.ctx.session();
            session.add(&business).await?;
            session.commit(cancel).await?;
            publish_pending(self.ctx.dispatcher.as_ref(), &mut business).await;

            tracing::info!(business_id = %business.id(), "business registered");
            Ok(BusinessDto::from(&business))
        })
        .await
    }

    #[tracing::instrument(skip(self, contact, cancel), fields(user_id = %principal.user_id))]
    pub async fn update_contact_info(
        &self,
        principal: &Principal,
        id: BusinessId,
        contact: ContactInput,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("update_business_contact_info", async {
            let contact = contact.validate()?;
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;
            principal.ensure_can_manage(business.owner_id(), "update this business")?;

            business.update_contact_info(contact, self.ctx.now())?;
            self.save(&session, &mut business, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn activate(
        &self,
        principal: &Principal,
        id: BusinessId,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("activate_business", async {
            principal.ensure_admin("activate businesses")?;
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;

            business.activate(self.ctx.now())?;
            self.save(&session, &mut business, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn suspend(
        &self,
        principal: &Principal,
        id: BusinessId,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("suspend_business", async {
            principal.ensure_admin("suspend businesses")?;
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;

            business.suspend(self.ctx.now())?;
            self.save(&session, &mut business, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn verify(
        &self,
        principal: &Principal,
        id: BusinessId,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("verify_business", async {
            principal.ensure_admin("verify businesses")?;
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;

            business.verify(self.ctx.now())?;
            self.save(&session, &mut business, cancel).await
        })
        .await
    }

    /// Uploads and attaches an image, removing the upload again when the
    /// business rejects it or the commit fails.
    #[tracing::instrument(skip(self, input, cancel), fields(user_id = %principal.user_id))]
    pub async fn add_image(
        &self,
        principal: &Principal,
        id: BusinessId,
        input: BusinessImageInput,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("add_business_image", async {
            input.upload.validate()?;
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;
            principal.ensure_can_manage(business.owner_id(), "add images to this business")?;

            cancel.check()?;
            let container = &self.ctx.settings.business_image_container;
            let upload = &input.upload;
            let blob = self
                .blobs
                .upload(container, &upload.file_name, &upload.content_type, &upload.data)
                .await?;

            let attached = async {
                business.add_image(
                    &blob.url,
                    &blob.blob_name,
                    input.alt_text.as_deref(),
                    input.make_primary,
                    self.ctx.now(),
                )?;
                session.update(&business).await?;
                session.commit(cancel).await?;
                Ok::<_, ApplicationError>(())
            }
            .await;
            if let Err(e) = attached {
                delete_blob_best_effort(self.blobs.as_ref(), container, &blob.blob_name).await;
                return Err(e);
            }

            publish_pending(self.ctx.dispatcher.as_ref(), &mut business).await;
            Ok(BusinessDto::from(&business))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn remove_image(
        &self,
        principal: &Principal,
        id: BusinessId,
        image_id: ImageId,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("remove_business_image", async {
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;
            principal.ensure_can_manage(business.owner_id(), "remove images from this business")?;

            let removed = business.remove_image(image_id, self.ctx.now())?;
            let dto = self.save(&session, &mut business, cancel).await?;
            delete_blob_best_effort(
                self.blobs.as_ref(),
                &self.ctx.settings.business_image_container,
                &removed.blob_name,
            )
            .await;
            Ok(dto)
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn set_primary_image(
        &self,
        principal: &Principal,
        id: BusinessId,
        image_id: ImageId,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        observe("set_primary_business_image", async {
            let session = self.ctx.session();
            let mut business: Business = load(&session, id, cancel, "Business").await?;
            principal.ensure_can_manage(business.owner_id(), "update this business")?;

            business.set_primary_image(image_id, self.ctx.now())?;
            self.save(&session, &mut business, cancel).await
        })
        .await
    }

    async fn save(
        &self,
        session: &Session<S>,
        business: &mut Business,
        cancel: &CancellationToken,
    ) -> Result<BusinessDto> {
        session.update(&*business).await?;
        session.commit(cancel).await?;
        publish_pending(self.ctx.dispatcher.as_ref(), business).await;
        Ok(BusinessDto::from(&*business))
    }
}

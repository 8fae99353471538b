use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{CancellationToken, EventId, ImageId, SignUpListId};
use domain::{AggregateRoot, Event, EventAnalytics, ViewRecord, ViewerKey};
use persistence::{
    DocumentStore, PersistenceError, Repository, Session, UnitOfWork, ViewRecordStore,
};

use super::{delete_blob_best_effort, load, observe, retry_on_conflict};
use crate::commands::{CreateSignUpList, EventInput, ImageUpload, RecordView};
use crate::context::{HandlerContext, Principal};
use crate::dispatch::publish_pending;
use crate::dto::{AnalyticsDto, EventDto, ViewOutcome};
use crate::error::{ApplicationError, Result};
use crate::services::BlobStorage;

/// Community event use cases.
pub struct EventHandlers<S: DocumentStore> {
    ctx: HandlerContext<S>,
    blobs: Arc<dyn BlobStorage>,
    views: Arc<dyn ViewRecordStore>,
}

impl<S: DocumentStore> EventHandlers<S> {
    pub fn new(
        ctx: HandlerContext<S>,
        blobs: Arc<dyn BlobStorage>,
        views: Arc<dyn ViewRecordStore>,
    ) -> Self {
        Self { ctx, blobs, views }
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn get(&self, id: EventId, cancel: &CancellationToken) -> Result<EventDto> {
        observe("get_event", async {
            let event: Event = load(&self.ctx.session(), id, cancel, "Event").await?;
            Ok(EventDto::from(&event))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<EventDto>> {
        observe("list_events", async {
            let events: Vec<Event> = self.ctx.session().list(cancel).await?;
            Ok(events.iter().map(EventDto::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip(self, input, cancel), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        input: EventInput,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("create_event", async {
            let details = input.validate()?;
            let now = self.ctx.now();
            let mut event = Event::create(principal.user_id, details, now)?;
            let analytics = EventAnalytics::create(event.id(), now)?;

            let session = self.ctx.session();
            session.add(&event).await?;
            session.add(&analytics).await?;
            session.commit(cancel).await?;
            publish_pending(self.ctx.dispatcher.as_ref(), &mut event).await;

            tracing::info!(event_id = %event.id(), "event created");
            Ok(EventDto::from(&event))
        })
        .await
    }

    #[tracing::instrument(skip(self, input, cancel), fields(user_id = %principal.user_id))]
    pub async fn update_details(
        &self,
        principal: &Principal,
        id: EventId,
        input: EventInput,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("update_event_details", async {
            let details = input.validate()?;
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "update this event")?;

            event.update_details(details, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn publish(
        &self,
        principal: &Principal,
        id: EventId,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("publish_event", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "publish this event")?;

            event.publish(self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn cancel(
        &self,
        principal: &Principal,
        id: EventId,
        reason: &str,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("cancel_event", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "cancel this event")?;

            event.cancel(reason, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn postpone(
        &self,
        principal: &Principal,
        id: EventId,
        reason: &str,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("postpone_event", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "postpone this event")?;

            event.postpone(reason, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn update_capacity(
        &self,
        principal: &Principal,
        id: EventId,
        capacity: u32,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("update_event_capacity", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "change the capacity of this event")?;

            event.update_capacity(capacity, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    /// Registers the principal and refreshes the event's analytics in the
    /// same commit.
    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn register(
        &self,
        principal: &Principal,
        id: EventId,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("register_for_event", async {
            let now = self.ctx.now();
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;

            event.register(principal.user_id, quantity, now)?;
            self.save_with_registrations(&session, &mut event, now, cancel)
                .await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn cancel_registration(
        &self,
        principal: &Principal,
        id: EventId,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("cancel_event_registration", async {
            let now = self.ctx.now();
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;

            event.cancel_registration(principal.user_id, now)?;
            self.save_with_registrations(&session, &mut event, now, cancel)
                .await
        })
        .await
    }

    /// Uploads the image, then attaches it. The upload is removed again if
    /// the event refuses the image or the commit fails.
    #[tracing::instrument(skip(self, upload, cancel), fields(user_id = %principal.user_id))]
    pub async fn add_image(
        &self,
        principal: &Principal,
        id: EventId,
        upload: ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("add_event_image", async {
            upload.validate()?;
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "add images to this event")?;

            cancel.check()?;
            let container = &self.ctx.settings.event_image_container;
            let blob = self
                .blobs
                .upload(container, &upload.file_name, &upload.content_type, &upload.data)
                .await?;

            let attached = async {
                event.add_image(&blob.url, &blob.blob_name, self.ctx.now())?;
                session.update(&event).await?;
                session.commit(cancel).await?;
                Ok::<_, ApplicationError>(())
            }
            .await;
            if let Err(e) = attached {
                delete_blob_best_effort(self.blobs.as_ref(), container, &blob.blob_name).await;
                return Err(e);
            }

            publish_pending(self.ctx.dispatcher.as_ref(), &mut event).await;
            Ok(EventDto::from(&event))
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn remove_image(
        &self,
        principal: &Principal,
        id: EventId,
        image_id: ImageId,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("remove_event_image", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "remove images from this event")?;

            let removed = event.remove_image(image_id, self.ctx.now())?;
            let dto = self.save(&session, &mut event, cancel).await?;
            delete_blob_best_effort(
                self.blobs.as_ref(),
                &self.ctx.settings.event_image_container,
                &removed.blob_name,
            )
            .await;
            Ok(dto)
        })
        .await
    }

    /// Deletes a draft or cancelled event together with its analytics.
    /// Image blobs are cleaned up afterwards on a best-effort basis.
    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn delete(
        &self,
        principal: &Principal,
        id: EventId,
        cancel: &CancellationToken,
    ) -> Result<()> {
        observe("delete_event", async {
            let session = self.ctx.session();
            let event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "delete this event")?;
            event.ensure_deletable()?;

            session.remove(&event).await?;
            let analytics: Option<EventAnalytics> =
                session.get_by_id(EventAnalytics::id_for(id), cancel).await?;
            if let Some(analytics) = &analytics {
                session.remove(analytics).await?;
            }
            session.commit(cancel).await?;

            for image in event.images() {
                delete_blob_best_effort(
                    self.blobs.as_ref(),
                    &self.ctx.settings.event_image_container,
                    &image.blob_name,
                )
                .await;
            }
            tracing::info!(event_id = %id, "event deleted");
            Ok(())
        })
        .await
    }

    /// Counts a page view unless the same viewer was counted for this event
    /// within the de-duplication window.
    #[tracing::instrument(skip(self, command, cancel), fields(event_id = %command.event_id))]
    pub async fn record_view(
        &self,
        command: RecordView,
        cancel: &CancellationToken,
    ) -> Result<ViewOutcome> {
        observe("record_event_view", async {
            let viewer = ViewerKey::resolve(command.user_id, &command.ip_address)?;
            let _: Event = load(&self.ctx.session(), command.event_id, cancel, "Event").await?;
            let record = ViewRecord::new(command.event_id, viewer, self.ctx.now());

            let (command, record) = (&command, &record);
            let counted = retry_on_conflict("record_event_view", move || {
                self.apply_view(command, record, cancel)
            })
            .await;

            match counted {
                Ok(analytics) => {
                    metrics::counter!("event_views_counted_total").increment(1);
                    Ok(ViewOutcome {
                        counted: true,
                        analytics: Some(analytics),
                    })
                }
                Err(ApplicationError::Persistence(PersistenceError::ViewAlreadyCounted {
                    ..
                })) => {
                    metrics::counter!("event_views_deduplicated_total").increment(1);
                    tracing::debug!(viewer = %viewer, "repeat view inside window not counted");
                    let analytics: Option<EventAnalytics> = self
                        .ctx
                        .session()
                        .get_by_id(EventAnalytics::id_for(command.event_id), cancel)
                        .await?;
                    Ok(ViewOutcome {
                        counted: false,
                        analytics: analytics.as_ref().map(AnalyticsDto::from),
                    })
                }
                Err(e) => Err(e),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn record_share(
        &self,
        id: EventId,
        cancel: &CancellationToken,
    ) -> Result<AnalyticsDto> {
        observe("record_event_share", async {
            let now = self.ctx.now();
            let _: Event = load(&self.ctx.session(), id, cancel, "Event").await?;

            retry_on_conflict("record_event_share", move || async move {
                let session = self.ctx.session();
                let (mut analytics, is_new) =
                    Self::load_or_create_analytics(&session, id, now, cancel).await?;
                analytics.record_share(now);
                self.save_analytics(&session, &mut analytics, is_new, cancel).await
            })
            .await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn get_analytics(
        &self,
        id: EventId,
        cancel: &CancellationToken,
    ) -> Result<AnalyticsDto> {
        observe("get_event_analytics", async {
            let session = self.ctx.session();
            let analytics: EventAnalytics =
                load(&session, EventAnalytics::id_for(id), cancel, "Event analytics").await?;
            Ok(AnalyticsDto::from(&analytics))
        })
        .await
    }

    #[tracing::instrument(skip(self, command, cancel), fields(user_id = %principal.user_id))]
    pub async fn create_sign_up_list(
        &self,
        principal: &Principal,
        id: EventId,
        command: CreateSignUpList,
        cancel: &CancellationToken,
    ) -> Result<SignUpListId> {
        observe("create_sign_up_list", async {
            let list = command.validate()?;
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "manage sign-up lists for this event")?;

            let list_id = event.add_sign_up_list(list, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await?;
            Ok(list_id)
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn remove_sign_up_list(
        &self,
        principal: &Principal,
        id: EventId,
        list_id: SignUpListId,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("remove_sign_up_list", async {
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;
            principal.ensure_can_manage(event.organizer_id(), "manage sign-up lists for this event")?;

            event.remove_sign_up_list(list_id, self.ctx.now())?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    /// Pledges the principal to bring an item on an open or predefined list.
    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn commit_to_sign_up_list(
        &self,
        principal: &Principal,
        id: EventId,
        list_id: SignUpListId,
        item_description: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("commit_to_sign_up_list", async {
            let now = self.ctx.now();
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;

            event
                .sign_up_list_mut(list_id, now)?
                .commit(principal.user_id, item_description, quantity, now)?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    #[tracing::instrument(skip(self, cancel), fields(user_id = %principal.user_id))]
    pub async fn cancel_commitment(
        &self,
        principal: &Principal,
        id: EventId,
        list_id: SignUpListId,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        observe("cancel_sign_up_commitment", async {
            let now = self.ctx.now();
            let session = self.ctx.session();
            let mut event: Event = load(&session, id, cancel, "Event").await?;

            event
                .sign_up_list_mut(list_id, now)?
                .cancel_commitment(principal.user_id)?;
            self.save(&session, &mut event, cancel).await
        })
        .await
    }

    /// Counts one view: the view record and the analytics increment commit
    /// together or not at all.
    async fn apply_view(
        &self,
        command: &RecordView,
        record: &ViewRecord,
        cancel: &CancellationToken,
    ) -> Result<AnalyticsDto> {
        let session = self.ctx.session();
        let first_view = self
            .views
            .counted_views(record.event_id, &record.viewer)
            .await?
            == 0;
        let (mut analytics, is_new) =
            Self::load_or_create_analytics(&session, record.event_id, record.viewed_at, cancel)
                .await?;
        analytics.record_view(command.user_id, &command.ip_address, record.viewed_at)?;
        if first_view {
            analytics.record_unique_viewer(record.viewed_at);
        }

        session
            .count_view(record.clone(), self.ctx.settings.view_dedup_window)
            .await;
        self.save_analytics(&session, &mut analytics, is_new, cancel).await
    }

    async fn load_or_create_analytics(
        session: &Session<S>,
        event_id: EventId,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<(EventAnalytics, bool)> {
        let existing: Option<EventAnalytics> = session
            .get_by_id(EventAnalytics::id_for(event_id), cancel)
            .await?;
        match existing {
            Some(analytics) => Ok((analytics, false)),
            None => Ok((EventAnalytics::create(event_id, now)?, true)),
        }
    }

    async fn save_analytics(
        &self,
        session: &Session<S>,
        analytics: &mut EventAnalytics,
        is_new: bool,
        cancel: &CancellationToken,
    ) -> Result<AnalyticsDto> {
        if is_new {
            session.add(&*analytics).await?;
        } else {
            session.update(&*analytics).await?;
        }
        session.commit(cancel).await?;
        publish_pending(self.ctx.dispatcher.as_ref(), analytics).await;
        Ok(AnalyticsDto::from(&*analytics))
    }

    async fn save_with_registrations(
        &self,
        session: &Session<S>,
        event: &mut Event,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        let analytics: Option<EventAnalytics> = session
            .get_by_id(EventAnalytics::id_for(event.id()), cancel)
            .await?;
        if let Some(mut analytics) = analytics {
            analytics.update_registration_count(u64::from(event.registered_count()), now);
            session.update(&analytics).await?;
        }
        self.save(session, event, cancel).await
    }

    async fn save(
        &self,
        session: &Session<S>,
        event: &mut Event,
        cancel: &CancellationToken,
    ) -> Result<EventDto> {
        session.update(&*event).await?;
        session.commit(cancel).await?;
        publish_pending(self.ctx.dispatcher.as_ref(), event).await;
        Ok(EventDto::from(&*event))
    }
}

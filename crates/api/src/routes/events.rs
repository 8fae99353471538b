//! Community event endpoints: lifecycle, registrations, images, views and
//! sign-up lists.

use std::sync::Arc;

use application::{AnalyticsDto, CreateSignUpList, EventDto, EventInput, RecordView, ViewOutcome};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{EventId, ImageId, SignUpListId};
use persistence::DocumentStore;
use serde::{Deserialize, Serialize};

use super::request_token;
use crate::error::ApiError;
use crate::extract::{Actor, ApiJson, ApiPath, ClientIp, ImageBody, MaybeActor};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct CapacityRequest {
    pub capacity: u32,
}

#[derive(Deserialize)]
pub struct RegistrationRequest {
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CommitmentRequest {
    pub item_description: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct SignUpListCreated {
    pub id: SignUpListId,
}

fn one() -> u32 {
    1
}

/// POST /events
#[tracing::instrument(skip_all)]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    let event = state.events.create(&principal, input, &request_token()).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<EventDto>>, ApiError> {
    Ok(Json(state.events.list(&request_token()).await?))
}

/// GET /events/{id}
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<EventDto>, ApiError> {
    Ok(Json(state.events.get(id, &request_token()).await?))
}

/// PUT /events/{id}
pub async fn update_details<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .update_details(&principal, id, input, &request_token())
        .await?;
    Ok(Json(event))
}

/// DELETE /events/{id}
pub async fn delete<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
) -> Result<StatusCode, ApiError> {
    state.events.delete(&principal, id, &request_token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /events/{id}/publish
pub async fn publish<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<EventDto>, ApiError> {
    Ok(Json(state.events.publish(&principal, id, &request_token()).await?))
}

/// POST /events/{id}/cancel
pub async fn cancel<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(request): ApiJson<ReasonRequest>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .cancel(&principal, id, &request.reason, &request_token())
        .await?;
    Ok(Json(event))
}

/// POST /events/{id}/postpone
pub async fn postpone<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(request): ApiJson<ReasonRequest>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .postpone(&principal, id, &request.reason, &request_token())
        .await?;
    Ok(Json(event))
}

/// PUT /events/{id}/capacity
pub async fn update_capacity<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(request): ApiJson<CapacityRequest>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .update_capacity(&principal, id, request.capacity, &request_token())
        .await?;
    Ok(Json(event))
}

/// POST /events/{id}/registrations
pub async fn register<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(request): ApiJson<RegistrationRequest>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .register(&principal, id, request.quantity, &request_token())
        .await?;
    Ok(Json(event))
}

/// DELETE /events/{id}/registrations
pub async fn cancel_registration<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .cancel_registration(&principal, id, &request_token())
        .await?;
    Ok(Json(event))
}

/// POST /events/{id}/images: raw image body.
pub async fn add_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ImageBody(upload): ImageBody,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    let event = state
        .events
        .add_image(&principal, id, upload, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// DELETE /events/{id}/images/{image_id}
pub async fn remove_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, image_id)): ApiPath<(EventId, ImageId)>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .remove_image(&principal, id, image_id, &request_token())
        .await?;
    Ok(Json(event))
}

/// POST /events/{id}/views: anonymous viewers are keyed by client address.
pub async fn record_view<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    MaybeActor(principal): MaybeActor,
    ClientIp(ip_address): ClientIp,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<ViewOutcome>, ApiError> {
    let command = RecordView {
        event_id: id,
        user_id: principal.map(|p| p.user_id),
        ip_address,
    };
    Ok(Json(state.events.record_view(command, &request_token()).await?))
}

/// POST /events/{id}/shares
pub async fn record_share<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<AnalyticsDto>, ApiError> {
    Ok(Json(state.events.record_share(id, &request_token()).await?))
}

/// GET /events/{id}/analytics
pub async fn analytics<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<EventId>,
) -> Result<Json<AnalyticsDto>, ApiError> {
    Ok(Json(state.events.get_analytics(id, &request_token()).await?))
}

/// POST /events/{id}/sign-up-lists
pub async fn create_sign_up_list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(command): ApiJson<CreateSignUpList>,
) -> Result<(StatusCode, Json<SignUpListCreated>), ApiError> {
    let list_id = state
        .events
        .create_sign_up_list(&principal, id, command, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(SignUpListCreated { id: list_id })))
}

/// DELETE /events/{id}/sign-up-lists/{list_id}
pub async fn remove_sign_up_list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, list_id)): ApiPath<(EventId, SignUpListId)>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .remove_sign_up_list(&principal, id, list_id, &request_token())
        .await?;
    Ok(Json(event))
}

/// POST /events/{id}/sign-up-lists/{list_id}/commitments
pub async fn commit<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, list_id)): ApiPath<(EventId, SignUpListId)>,
    ApiJson(request): ApiJson<CommitmentRequest>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .commit_to_sign_up_list(
            &principal,
            id,
            list_id,
            &request.item_description,
            request.quantity,
            &request_token(),
        )
        .await?;
    Ok(Json(event))
}

/// DELETE /events/{id}/sign-up-lists/{list_id}/commitments
pub async fn cancel_commitment<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, list_id)): ApiPath<(EventId, SignUpListId)>,
) -> Result<Json<EventDto>, ApiError> {
    let event = state
        .events
        .cancel_commitment(&principal, id, list_id, &request_token())
        .await?;
    Ok(Json(event))
}

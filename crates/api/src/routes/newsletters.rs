//! Newsletter endpoints.

use std::sync::Arc;

use application::{NewsletterDto, NewsletterInput, SendReport};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::NewsletterId;
use persistence::DocumentStore;
use serde::Serialize;

use super::request_token;
use crate::error::ApiError;
use crate::extract::{Actor, ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Serialize)]
pub struct DeactivatedResponse {
    pub deactivated: usize,
}

/// POST /newsletters
#[tracing::instrument(skip_all)]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiJson(input): ApiJson<NewsletterInput>,
) -> Result<(StatusCode, Json<NewsletterDto>), ApiError> {
    let newsletter = state
        .newsletters
        .create(&principal, input, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(newsletter)))
}

/// GET /newsletters
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<NewsletterDto>>, ApiError> {
    Ok(Json(state.newsletters.list(&request_token()).await?))
}

/// GET /newsletters/{id}
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<Json<NewsletterDto>, ApiError> {
    Ok(Json(state.newsletters.get(id, &request_token()).await?))
}

/// PUT /newsletters/{id}
pub async fn update<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
    ApiJson(input): ApiJson<NewsletterInput>,
) -> Result<Json<NewsletterDto>, ApiError> {
    let newsletter = state
        .newsletters
        .update(&principal, id, input, &request_token())
        .await?;
    Ok(Json(newsletter))
}

/// POST /newsletters/{id}/publish
pub async fn publish<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<Json<NewsletterDto>, ApiError> {
    let newsletter = state
        .newsletters
        .publish(&principal, id, &request_token())
        .await?;
    Ok(Json(newsletter))
}

/// POST /newsletters/{id}/unpublish
pub async fn unpublish<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<Json<NewsletterDto>, ApiError> {
    let newsletter = state
        .newsletters
        .unpublish(&principal, id, &request_token())
        .await?;
    Ok(Json(newsletter))
}

/// POST /newsletters/{id}/send
pub async fn send<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<Json<SendReport>, ApiError> {
    let report = state
        .newsletters
        .send(&principal, id, &request_token())
        .await?;
    Ok(Json(report))
}

/// POST /newsletters/{id}/reactivate
pub async fn reactivate<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<Json<NewsletterDto>, ApiError> {
    let newsletter = state
        .newsletters
        .reactivate(&principal, id, &request_token())
        .await?;
    Ok(Json(newsletter))
}

/// DELETE /newsletters/{id}
pub async fn delete<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<NewsletterId>,
) -> Result<StatusCode, ApiError> {
    state
        .newsletters
        .delete(&principal, id, &request_token())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /newsletters/deactivate-expired: admin-only sweep.
pub async fn deactivate_expired<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
) -> Result<Json<DeactivatedResponse>, ApiError> {
    principal.ensure_admin("deactivate expired newsletters")?;
    let deactivated = state.newsletters.deactivate_expired(&request_token()).await?;
    Ok(Json(DeactivatedResponse { deactivated }))
}

//! Badge endpoints. Changes require the admin role.

use std::sync::Arc;

use application::{BadgeDto, CreateBadge, UpdateBadge};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::BadgeId;
use persistence::DocumentStore;
use serde::Deserialize;

use super::request_token;
use crate::error::ApiError;
use crate::extract::{Actor, ApiJson, ApiPath, ImageBody};
use crate::state::AppState;

/// Badge fields sent alongside a new image. Placements start at their
/// defaults and can be changed with `PUT /badges/{id}`.
#[derive(Debug, Deserialize)]
pub struct NewBadgeQuery {
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
}

/// POST /badges?name=..&display_order=..: raw image body.
#[tracing::instrument(skip_all)]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    Query(query): Query<NewBadgeQuery>,
    ImageBody(image): ImageBody,
) -> Result<(StatusCode, Json<BadgeDto>), ApiError> {
    let command = CreateBadge {
        name: query.name,
        placements: Default::default(),
        display_order: query.display_order,
        image,
    };
    let badge = state
        .badges
        .create(&principal, command, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

/// GET /badges: ordered by display order.
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<BadgeDto>>, ApiError> {
    Ok(Json(state.badges.list(&request_token()).await?))
}

/// GET /badges/{id}
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<BadgeId>,
) -> Result<Json<BadgeDto>, ApiError> {
    Ok(Json(state.badges.get(id, &request_token()).await?))
}

/// PUT /badges/{id}
pub async fn update<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BadgeId>,
    ApiJson(command): ApiJson<UpdateBadge>,
) -> Result<Json<BadgeDto>, ApiError> {
    let badge = state
        .badges
        .update(&principal, id, command, &request_token())
        .await?;
    Ok(Json(badge))
}

/// PUT /badges/{id}/image: raw image body.
pub async fn update_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BadgeId>,
    ImageBody(image): ImageBody,
) -> Result<Json<BadgeDto>, ApiError> {
    let badge = state
        .badges
        .update_image(&principal, id, image, &request_token())
        .await?;
    Ok(Json(badge))
}

/// POST /badges/{id}/activate
pub async fn activate<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BadgeId>,
) -> Result<Json<BadgeDto>, ApiError> {
    Ok(Json(
        state.badges.activate(&principal, id, &request_token()).await?,
    ))
}

/// POST /badges/{id}/deactivate
pub async fn deactivate<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BadgeId>,
) -> Result<Json<BadgeDto>, ApiError> {
    Ok(Json(
        state.badges.deactivate(&principal, id, &request_token()).await?,
    ))
}

/// DELETE /badges/{id}
pub async fn delete<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BadgeId>,
) -> Result<StatusCode, ApiError> {
    state.badges.delete(&principal, id, &request_token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Business directory endpoints.

use std::sync::Arc;

use application::{BusinessDto, BusinessImageInput, ContactInput, CreateBusiness};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::{BusinessId, ImageId};
use persistence::DocumentStore;
use serde::Deserialize;

use super::request_token;
use crate::error::ApiError;
use crate::extract::{Actor, ApiJson, ApiPath, ImageBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ImageOptions {
    pub alt_text: Option<String>,
    #[serde(default)]
    pub make_primary: bool,
}

/// POST /businesses
#[tracing::instrument(skip_all)]
pub async fn create<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiJson(command): ApiJson<CreateBusiness>,
) -> Result<(StatusCode, Json<BusinessDto>), ApiError> {
    let business = state
        .businesses
        .create(&principal, command, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(business)))
}

/// GET /businesses
pub async fn list<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<BusinessDto>>, ApiError> {
    Ok(Json(state.businesses.list(&request_token()).await?))
}

/// GET /businesses/{id}
pub async fn get<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<BusinessId>,
) -> Result<Json<BusinessDto>, ApiError> {
    Ok(Json(state.businesses.get(id, &request_token()).await?))
}

/// PUT /businesses/{id}/contact
pub async fn update_contact_info<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BusinessId>,
    ApiJson(contact): ApiJson<ContactInput>,
) -> Result<Json<BusinessDto>, ApiError> {
    let business = state
        .businesses
        .update_contact_info(&principal, id, contact, &request_token())
        .await?;
    Ok(Json(business))
}

/// POST /businesses/{id}/activate
pub async fn activate<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BusinessId>,
) -> Result<Json<BusinessDto>, ApiError> {
    Ok(Json(
        state.businesses.activate(&principal, id, &request_token()).await?,
    ))
}

/// POST /businesses/{id}/suspend
pub async fn suspend<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BusinessId>,
) -> Result<Json<BusinessDto>, ApiError> {
    Ok(Json(
        state.businesses.suspend(&principal, id, &request_token()).await?,
    ))
}

/// POST /businesses/{id}/verify
pub async fn verify<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BusinessId>,
) -> Result<Json<BusinessDto>, ApiError> {
    Ok(Json(
        state.businesses.verify(&principal, id, &request_token()).await?,
    ))
}

/// POST /businesses/{id}/images?alt_text=..&make_primary=..: raw image body.
pub async fn add_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath(id): ApiPath<BusinessId>,
    Query(options): Query<ImageOptions>,
    ImageBody(upload): ImageBody,
) -> Result<(StatusCode, Json<BusinessDto>), ApiError> {
    let input = BusinessImageInput {
        upload,
        alt_text: options.alt_text,
        make_primary: options.make_primary,
    };
    let business = state
        .businesses
        .add_image(&principal, id, input, &request_token())
        .await?;
    Ok((StatusCode::CREATED, Json(business)))
}

/// DELETE /businesses/{id}/images/{image_id}
pub async fn remove_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, image_id)): ApiPath<(BusinessId, ImageId)>,
) -> Result<Json<BusinessDto>, ApiError> {
    let business = state
        .businesses
        .remove_image(&principal, id, image_id, &request_token())
        .await?;
    Ok(Json(business))
}

/// PUT /businesses/{id}/images/{image_id}/primary
pub async fn set_primary_image<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(principal): Actor,
    ApiPath((id, image_id)): ApiPath<(BusinessId, ImageId)>,
) -> Result<Json<BusinessDto>, ApiError> {
    let business = state
        .businesses
        .set_primary_image(&principal, id, image_id, &request_token())
        .await?;
    Ok(Json(business))
}

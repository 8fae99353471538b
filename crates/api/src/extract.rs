//! Request extractors that reject with problem details.

use std::net::SocketAddr;

use application::{ImageUpload, Principal};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::UserId;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the acting user's role; `admin` grants admin rights.
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Header carrying the original file name of an uploaded image.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// The authenticated caller. Rejects requests without a user id.
pub struct Actor(pub Principal);

/// The caller, when one is identified.
pub struct MaybeActor(pub Option<Principal>);

/// The client address: the first `x-forwarded-for` entry, else the peer.
pub struct ClientIp(pub String);

/// JSON body whose rejection is a problem-details response.
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejection is a problem-details response.
pub struct ApiPath<T>(pub T);

/// A raw image upload: body bytes, `content-type` and `x-file-name`.
pub struct ImageBody(pub ImageUpload);

fn principal_from_headers(headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let uuid = value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ApiError::BadRequest(format!("{USER_ID_HEADER} must be a UUID")))?;
    let user_id = UserId::from_uuid(uuid);

    let is_admin = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));
    Ok(Some(if is_admin {
        Principal::admin(user_id)
    } else {
        Principal::user(user_id)
    }))
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers)?
            .map(Actor)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).map(MaybeActor)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };
        Ok(ClientIp(forwarded.or_else(peer).unwrap_or_default()))
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ApiPath(value))
    }
}

impl<S: Send + Sync> FromRequest<S> for ImageBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (content_type, file_name) = {
            let header = |name: &'static str| {
                req.headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .unwrap_or_default()
            };
            (header("content-type"), header(FILE_NAME_HEADER))
        };

        let data = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ImageBody(ImageUpload {
            file_name,
            content_type,
            data: data.to_vec(),
        }))
    }
}

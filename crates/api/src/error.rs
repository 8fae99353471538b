//! API error types with problem-details HTTP responses.

use application::ApplicationError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ErrorKind, Failure};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A handler returned an error.
    Application(ApplicationError),
    /// The request itself could not be understood.
    BadRequest(String),
    /// No acting user was identified.
    Unauthorized(String),
}

/// RFC 9457 problem details body.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Status, title and type URI for each failure kind.
pub fn problem_for(kind: ErrorKind) -> (StatusCode, &'static str, &'static str) {
    match kind {
        ErrorKind::Validation => (
            StatusCode::BAD_REQUEST,
            "Validation failed",
            "https://tools.ietf.org/html/rfc9110#section-15.5.1",
        ),
        ErrorKind::DomainRule => (
            StatusCode::BAD_REQUEST,
            "Business rule violated",
            "https://tools.ietf.org/html/rfc9110#section-15.5.1",
        ),
        ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            "Resource not found",
            "https://tools.ietf.org/html/rfc9110#section-15.5.5",
        ),
        ErrorKind::Forbidden => (
            StatusCode::FORBIDDEN,
            "Forbidden",
            "https://tools.ietf.org/html/rfc9110#section-15.5.4",
        ),
        ErrorKind::Conflict => (
            StatusCode::CONFLICT,
            "Conflict",
            "https://tools.ietf.org/html/rfc9110#section-15.5.10",
        ),
    }
}

impl ApiError {
    fn problem(self) -> ProblemDetails {
        match self {
            ApiError::Application(ApplicationError::Failure(failure)) => {
                let (status, title, problem_type) = problem_for(failure.kind());
                let errors: Vec<String> =
                    failure.messages().into_iter().map(str::to_string).collect();
                ProblemDetails {
                    problem_type,
                    title,
                    status: status.as_u16(),
                    detail: failure.first().message().to_string(),
                    errors,
                }
            }
            ApiError::Application(ApplicationError::Persistence(e)) if e.is_conflict() => {
                tracing::warn!(error = %e, "concurrent modification");
                let (status, title, problem_type) = problem_for(ErrorKind::Conflict);
                ProblemDetails {
                    problem_type,
                    title,
                    status: status.as_u16(),
                    detail: "The resource was changed by another request. Please retry."
                        .to_string(),
                    errors: Vec::new(),
                }
            }
            ApiError::Application(ApplicationError::Cancelled(_)) => ProblemDetails {
                problem_type: "https://tools.ietf.org/html/rfc9110#section-15.6.4",
                title: "Request cancelled",
                status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                detail: "The request was cancelled before it completed".to_string(),
                errors: Vec::new(),
            },
            ApiError::Application(e) => {
                tracing::error!(error = %e, "internal server error");
                ProblemDetails {
                    problem_type: "https://tools.ietf.org/html/rfc9110#section-15.6.1",
                    title: "Internal server error",
                    status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    detail: "An unexpected error occurred".to_string(),
                    errors: Vec::new(),
                }
            }
            ApiError::BadRequest(detail) => {
                let (status, _, problem_type) = problem_for(ErrorKind::Validation);
                ProblemDetails {
                    problem_type,
                    title: "Bad request",
                    status: status.as_u16(),
                    detail,
                    errors: Vec::new(),
                }
            }
            ApiError::Unauthorized(detail) => ProblemDetails {
                problem_type: "https://tools.ietf.org/html/rfc9110#section-15.5.2",
                title: "Unauthorized",
                status: StatusCode::UNAUTHORIZED.as_u16(),
                detail,
                errors: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = self.problem();
        metrics::counter!("api_problem_responses_total", "status" => problem.status.to_string())
            .increment(1);
        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/problem+json")],
            Json(problem),
        )
            .into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError::Application(failure.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(problem_for(ErrorKind::Validation).0, StatusCode::BAD_REQUEST);
        assert_eq!(problem_for(ErrorKind::DomainRule).0, StatusCode::BAD_REQUEST);
        assert_eq!(problem_for(ErrorKind::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(problem_for(ErrorKind::Forbidden).0, StatusCode::FORBIDDEN);
        assert_eq!(problem_for(ErrorKind::Conflict).0, StatusCode::CONFLICT);
    }

    #[test]
    fn test_failure_lists_every_message() {
        let failure = Failure::validation("Title is required")
            .merge(Failure::validation("Description is required"));
        let problem = ApiError::from(ApplicationError::from(failure)).problem();
        assert_eq!(problem.status, 400);
        assert_eq!(problem.detail, "Title is required");
        assert_eq!(problem.errors.len(), 2);
    }

    #[test]
    fn test_mixed_failure_uses_precedence() {
        let failure =
            Failure::validation("Title is required").merge(Failure::not_found("Event not found"));
        let problem = ApiError::from(ApplicationError::from(failure)).problem();
        assert_eq!(problem.status, 404);
    }
}

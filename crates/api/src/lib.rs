//! HTTP API for the community platform.
//!
//! Exposes newsletters, events, businesses and badges over REST, with
//! problem-details errors, structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::{DocumentStore, ViewRecordStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::{ApiError, ProblemDetails};
pub use state::{AppState, Collaborators, TracingEventHandler, create_default_state};

/// Largest request body accepted; image uploads are capped lower by the
/// handlers.
const MAX_BODY_BYTES: usize = 11 * 1024 * 1024;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router
where
    S: DocumentStore + ViewRecordStore,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(newsletter_routes::<S>())
        .merge(event_routes::<S>())
        .merge(business_routes::<S>())
        .merge(badge_routes::<S>())
        .with_state(state)
        .merge(metrics_router)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

fn newsletter_routes<S: DocumentStore>() -> Router<Arc<AppState<S>>> {
    use routes::newsletters as n;
    Router::new()
        .route("/newsletters", post(n::create::<S>).get(n::list::<S>))
        .route(
            "/newsletters/deactivate-expired",
            post(n::deactivate_expired::<S>),
        )
        .route(
            "/newsletters/{id}",
            get(n::get::<S>).put(n::update::<S>).delete(n::delete::<S>),
        )
        .route("/newsletters/{id}/publish", post(n::publish::<S>))
        .route("/newsletters/{id}/unpublish", post(n::unpublish::<S>))
        .route("/newsletters/{id}/send", post(n::send::<S>))
        .route("/newsletters/{id}/reactivate", post(n::reactivate::<S>))
}

fn event_routes<S: DocumentStore>() -> Router<Arc<AppState<S>>> {
    use routes::events as e;
    Router::new()
        .route("/events", post(e::create::<S>).get(e::list::<S>))
        .route(
            "/events/{id}",
            get(e::get::<S>)
                .put(e::update_details::<S>)
                .delete(e::delete::<S>),
        )
        .route("/events/{id}/publish", post(e::publish::<S>))
        .route("/events/{id}/cancel", post(e::cancel::<S>))
        .route("/events/{id}/postpone", post(e::postpone::<S>))
        .route("/events/{id}/capacity", put(e::update_capacity::<S>))
        .route(
            "/events/{id}/registrations",
            post(e::register::<S>).delete(e::cancel_registration::<S>),
        )
        .route("/events/{id}/images", post(e::add_image::<S>))
        .route("/events/{id}/images/{image_id}", delete(e::remove_image::<S>))
        .route("/events/{id}/views", post(e::record_view::<S>))
        .route("/events/{id}/shares", post(e::record_share::<S>))
        .route("/events/{id}/analytics", get(e::analytics::<S>))
        .route("/events/{id}/sign-up-lists", post(e::create_sign_up_list::<S>))
        .route(
            "/events/{id}/sign-up-lists/{list_id}",
            delete(e::remove_sign_up_list::<S>),
        )
        .route(
            "/events/{id}/sign-up-lists/{list_id}/commitments",
            post(e::commit::<S>).delete(e::cancel_commitment::<S>),
        )
}

fn business_routes<S: DocumentStore>() -> Router<Arc<AppState<S>>> {
    use routes::businesses as b;
    Router::new()
        .route("/businesses", post(b::create::<S>).get(b::list::<S>))
        .route("/businesses/{id}", get(b::get::<S>))
        .route("/businesses/{id}/contact", put(b::update_contact_info::<S>))
        .route("/businesses/{id}/activate", post(b::activate::<S>))
        .route("/businesses/{id}/suspend", post(b::suspend::<S>))
        .route("/businesses/{id}/verify", post(b::verify::<S>))
        .route("/businesses/{id}/images", post(b::add_image::<S>))
        .route(
            "/businesses/{id}/images/{image_id}",
            delete(b::remove_image::<S>),
        )
        .route(
            "/businesses/{id}/images/{image_id}/primary",
            put(b::set_primary_image::<S>),
        )
}

fn badge_routes<S: DocumentStore>() -> Router<Arc<AppState<S>>> {
    use routes::badges as b;
    Router::new()
        .route("/badges", post(b::create::<S>).get(b::list::<S>))
        .route(
            "/badges/{id}",
            get(b::get::<S>).put(b::update::<S>).delete(b::delete::<S>),
        )
        .route("/badges/{id}/image", put(b::update_image::<S>))
        .route("/badges/{id}/activate", post(b::activate::<S>))
        .route("/badges/{id}/deactivate", post(b::deactivate::<S>))
}

//! Handler services.
//!
//! Every handler follows the same shape: validate the command, load,
//! authorize the principal, call domain methods, stage, commit once, then
//! drain and dispatch the domain events and map to a DTO.

mod badge;
mod business;
mod event;
mod newsletter;

pub use badge::BadgeHandlers;
pub use business::BusinessHandlers;
pub use event::EventHandlers;
pub use newsletter::NewsletterHandlers;

use std::future::Future;

use common::{CancellationToken, Failure};
use domain::AggregateRoot;
use persistence::{DocumentStore, Repository, Session};

use crate::error::{ApplicationError, Result};
use crate::services::BlobStorage;

/// Runs one handler invocation, then logs and counts its outcome.
pub(crate) async fn observe<T, F>(handler: &'static str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let result = operation.await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    };
    metrics::counter!("handler_requests_total", "handler" => handler, "outcome" => outcome)
        .increment(1);

    match &result {
        Ok(_) => tracing::info!(handler, "handler completed"),
        Err(ApplicationError::Failure(failure)) => tracing::warn!(
            handler,
            kind = %failure.kind(),
            errors = %failure,
            "handler rejected command"
        ),
        Err(ApplicationError::Cancelled(_)) => tracing::info!(handler, "handler cancelled"),
        Err(e) => tracing::error!(handler, error = %e, "handler failed"),
    }
    result
}

/// Re-runs `attempt` while its commit loses an optimistic-concurrency race.
///
/// A conflict means another writer committed in between, so every round
/// makes progress. Cancellation stops the loop at the next load.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    operation: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries: u32 = 0;
    loop {
        match attempt().await {
            Err(ApplicationError::Persistence(e)) if e.is_conflict() => {
                retries += 1;
                metrics::counter!("commit_retries_total", "operation" => operation).increment(1);
                tracing::debug!(operation, retries, error = %e, "commit conflicted, retrying");
                tokio::task::yield_now().await;
            }
            other => return other,
        }
    }
}

/// Loads an aggregate or fails with `"<label> not found"`.
pub(crate) async fn load<S, A>(
    session: &Session<S>,
    id: A::Id,
    cancel: &CancellationToken,
    label: &str,
) -> Result<A>
where
    S: DocumentStore,
    A: AggregateRoot,
{
    Repository::<A>::get_by_id(session, id, cancel)
        .await?
        .ok_or_else(|| Failure::not_found(format!("{label} not found")).into())
}

/// Deletes a blob, logging instead of failing.
pub(crate) async fn delete_blob_best_effort(
    blobs: &dyn BlobStorage,
    container: &str,
    blob_name: &str,
) {
    match blobs.delete(container, blob_name).await {
        Ok(()) => tracing::debug!(container, blob_name, "blob deleted"),
        Err(e) => {
            metrics::counter!("blob_cleanup_failures_total").increment(1);
            tracing::warn!(container, blob_name, error = %e, "blob cleanup failed");
        }
    }
}

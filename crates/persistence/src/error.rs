use common::{Cancelled, Version};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when loading or committing aggregates.
///
/// These are infrastructure failures. They never become domain failures and
/// surface at the HTTP boundary as server errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The stored version no longer matches the version the aggregate was
    /// loaded at. The whole commit was rejected.
    #[error(
        "Concurrency conflict for {collection} {id}: expected version {expected}, found {actual:?}"
    )]
    ConcurrencyConflict {
        collection: String,
        id: Uuid,
        expected: Version,
        actual: Option<Version>,
    },

    /// An aggregate with the same id was already stored.
    #[error("{collection} {id} already exists")]
    DuplicateKey { collection: String, id: Uuid },

    /// The viewer was already counted for this event inside the
    /// de-duplication window. The whole commit was rejected.
    #[error("View of event {event_id} by {viewer} already counted")]
    ViewAlreadyCounted { event_id: Uuid, viewer: String },

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The caller gave up before the operation started.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            PersistenceError::ConcurrencyConflict { .. } | PersistenceError::DuplicateKey { .. }
        )
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

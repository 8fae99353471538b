use async_trait::async_trait;
use common::{EventId, Version};
use domain::{DedupWindow, ViewRecord, ViewerKey};
use uuid::Uuid;

use crate::Result;

/// An aggregate as stored: its JSON body and the version it was written at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub version: Version,
    pub body: serde_json::Value,
}

/// A staged write, applied when the unit of work commits.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// Stores a new aggregate at [`Version::first`].
    Insert {
        collection: &'static str,
        id: Uuid,
        body: serde_json::Value,
    },
    /// Replaces an aggregate still at `expected`, bumping its version.
    Update {
        collection: &'static str,
        id: Uuid,
        expected: Version,
        body: serde_json::Value,
    },
    /// Deletes an aggregate still at `expected`.
    Delete {
        collection: &'static str,
        id: Uuid,
        expected: Version,
    },
    /// Stores a counted view. Fails the whole batch with
    /// `ViewAlreadyCounted` when the same viewer was counted for the event
    /// within `window`.
    CountView {
        record: ViewRecord,
        window: DedupWindow,
    },
}

impl DocumentChange {
    pub const VIEW_RECORDS: &'static str = "EventViewRecord";

    pub fn collection(&self) -> &'static str {
        match self {
            DocumentChange::Insert { collection, .. }
            | DocumentChange::Update { collection, .. }
            | DocumentChange::Delete { collection, .. } => collection,
            DocumentChange::CountView { .. } => Self::VIEW_RECORDS,
        }
    }

    /// The document id, or the event id for a counted view.
    pub fn id(&self) -> Uuid {
        match self {
            DocumentChange::Insert { id, .. }
            | DocumentChange::Update { id, .. }
            | DocumentChange::Delete { id, .. } => *id,
            DocumentChange::CountView { record, .. } => record.event_id.as_uuid(),
        }
    }
}

/// Storage backend for aggregate documents.
///
/// Implementations must be thread-safe and cheap to clone; a clone shares
/// the same underlying storage.
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Loads one document.
    async fn load(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>>;

    /// Loads every document of a collection, oldest first.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// Applies all changes atomically: either every change is written or
    /// none is. A stale `expected` version fails the whole batch with
    /// `ConcurrencyConflict`; a de-duplicated view fails it with
    /// `ViewAlreadyCounted`.
    ///
    /// Returns the number of documents written.
    async fn apply(&self, changes: Vec<DocumentChange>) -> Result<usize>;
}

/// Storage for individual event views, used to de-duplicate view counts.
#[async_trait]
pub trait ViewRecordStore: Send + Sync {
    /// Stores `record` if no view from the same viewer for the same event
    /// was counted within `window`, and reports whether it was stored.
    ///
    /// The check and the insert happen as one step, so two concurrent
    /// requests cannot both be counted.
    async fn try_record(&self, record: &ViewRecord, window: DedupWindow) -> Result<bool>;

    /// Returns how many views from `viewer` were counted for an event.
    async fn counted_views(&self, event_id: EventId, viewer: &ViewerKey) -> Result<u64>;
}

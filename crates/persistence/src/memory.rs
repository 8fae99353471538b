use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EventId, Version};
use domain::{DedupWindow, ViewRecord, ViewerKey};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{DocumentChange, DocumentStore, StoredDocument, ViewRecordStore};
use crate::{PersistenceError, Result};

type DocumentKey = (String, Uuid);
type ViewKey = (EventId, String);

#[derive(Debug, Clone)]
struct Entry {
    document: StoredDocument,
    seq: u64,
}

#[derive(Debug, Default)]
struct Documents {
    entries: HashMap<DocumentKey, Entry>,
    next_seq: u64,
}

/// In-memory store for tests and local runs.
///
/// This implementation keeps documents and view records in memory and
/// provides the same guarantees as the PostgreSQL implementation: batches
/// are applied atomically and view de-duplication is race-free.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<Documents>>,
    views: Arc<RwLock<HashMap<ViewKey, Vec<DateTime<Utc>>>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.entries.len()
    }

    /// Returns how many views were stored for an event.
    pub async fn view_count(&self, event_id: EventId) -> usize {
        self.views
            .read()
            .await
            .iter()
            .filter(|((id, _), _)| *id == event_id)
            .map(|(_, views)| views.len())
            .sum()
    }

    /// Makes every operation fail with `Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Clears all documents and view records.
    pub async fn clear(&self) {
        *self.documents.write().await = Documents::default();
        self.views.write().await.clear();
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }

    fn check_change(documents: &Documents, change: &DocumentChange) -> Result<()> {
        let key = (change.collection().to_string(), change.id());
        let current = documents.entries.get(&key).map(|e| e.document.version);
        match change {
            DocumentChange::Insert { .. } if current.is_some() => {
                Err(PersistenceError::DuplicateKey {
                    collection: key.0,
                    id: key.1,
                })
            }
            DocumentChange::Update { expected, .. } | DocumentChange::Delete { expected, .. }
                if current != Some(*expected) =>
            {
                Err(PersistenceError::ConcurrencyConflict {
                    collection: key.0,
                    id: key.1,
                    expected: *expected,
                    actual: current,
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn load(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        self.ensure_available()?;
        let documents = self.documents.read().await;
        Ok(documents
            .entries
            .get(&(collection.to_string(), id))
            .map(|entry| entry.document.clone()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        self.ensure_available()?;
        let documents = self.documents.read().await;
        let mut entries: Vec<_> = documents
            .entries
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, entry)| entry.clone())
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(entries.into_iter().map(|entry| entry.document).collect())
    }

    async fn apply(&self, changes: Vec<DocumentChange>) -> Result<usize> {
        self.ensure_available()?;
        let mut documents = self.documents.write().await;
        let mut views = self.views.write().await;

        // Validate the whole batch against scratch copies first so a late
        // failure leaves nothing half-applied.
        let mut scratch = Documents {
            entries: documents.entries.clone(),
            next_seq: documents.next_seq,
        };
        let mut counted: Vec<(ViewKey, DateTime<Utc>)> = Vec::new();
        for change in &changes {
            Self::check_change(&scratch, change)?;
            match change {
                DocumentChange::Insert {
                    collection,
                    id,
                    body,
                } => {
                    let seq = scratch.next_seq;
                    scratch.next_seq += 1;
                    scratch.entries.insert(
                        (collection.to_string(), *id),
                        Entry {
                            document: StoredDocument {
                                id: *id,
                                version: Version::first(),
                                body: body.clone(),
                            },
                            seq,
                        },
                    );
                }
                DocumentChange::Update {
                    collection,
                    id,
                    expected,
                    body,
                } => {
                    if let Some(entry) = scratch.entries.get_mut(&(collection.to_string(), *id)) {
                        entry.document.version = expected.next();
                        entry.document.body = body.clone();
                    }
                }
                DocumentChange::Delete { collection, id, .. } => {
                    scratch.entries.remove(&(collection.to_string(), *id));
                }
                DocumentChange::CountView { record, window } => {
                    let key = (record.event_id, record.viewer.as_key());
                    let last = counted
                        .iter()
                        .rev()
                        .find(|(k, _)| *k == key)
                        .map(|(_, at)| *at)
                        .or_else(|| views.get(&key).and_then(|v| v.last().copied()));
                    if !window.should_count(last, record.viewed_at) {
                        return Err(PersistenceError::ViewAlreadyCounted {
                            event_id: record.event_id.as_uuid(),
                            viewer: key.1,
                        });
                    }
                    counted.push((key, record.viewed_at));
                }
            }
        }

        *documents = scratch;
        for (key, viewed_at) in counted {
            views.entry(key).or_default().push(viewed_at);
        }
        Ok(changes.len())
    }
}

#[async_trait]
impl ViewRecordStore for InMemoryStore {
    async fn try_record(&self, record: &ViewRecord, window: DedupWindow) -> Result<bool> {
        self.ensure_available()?;
        let mut views = self.views.write().await;
        let counted = views
            .entry((record.event_id, record.viewer.as_key()))
            .or_default();

        if !window.should_count(counted.last().copied(), record.viewed_at) {
            return Ok(false);
        }
        counted.push(record.viewed_at);
        Ok(true)
    }

    async fn counted_views(&self, event_id: EventId, viewer: &ViewerKey) -> Result<u64> {
        self.ensure_available()?;
        let views = self.views.read().await;
        Ok(views
            .get(&(event_id, viewer.as_key()))
            .map_or(0, |counted| counted.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn insert(id: Uuid) -> DocumentChange {
        DocumentChange::Insert {
            collection: "Test",
            id,
            body: serde_json::json!({"name": "first"}),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.apply(vec![insert(id)]).await.unwrap(), 1);

        let document = store.load("Test", id).await.unwrap().unwrap();
        assert_eq!(document.version, Version::first());
        assert_eq!(document.body["name"], "first");
        assert!(store.load("Other", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store.apply(vec![insert(id)]).await.unwrap();

        let err = store.apply(vec![insert(id)]).await.unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let store = InMemoryStore::new();
        let existing = Uuid::new_v4();
        store.apply(vec![insert(existing)]).await.unwrap();

        let fresh = Uuid::new_v4();
        let stale = DocumentChange::Update {
            collection: "Test",
            id: existing,
            expected: Version::new(7),
            body: serde_json::json!({}),
        };
        let err = store.apply(vec![insert(fresh), stale]).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(store.load("Test", fresh).await.unwrap().is_none());
        assert_eq!(store.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = InMemoryStore::new();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.apply(vec![insert(*id)]).await.unwrap();
        }

        let listed: Vec<Uuid> = store
            .list("Test")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        let err = store.load("Test", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable(_)));

        store.set_unavailable(false);
        assert!(store.load("Test", Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_view_dedup_window() {
        let store = InMemoryStore::new();
        let event_id = EventId::new();
        let viewer = ViewerKey::resolve(None, "1.2.3.4").unwrap();
        let window = DedupWindow::default();
        let start = Utc::now();

        let at = |secs| ViewRecord::new(event_id, viewer, start + Duration::seconds(secs));
        assert!(store.try_record(&at(0), window).await.unwrap());
        assert!(!store.try_record(&at(120), window).await.unwrap());
        assert!(store.try_record(&at(300), window).await.unwrap());
        assert_eq!(store.view_count(event_id).await, 2);
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_counted_view_rolls_back_with_its_batch() {
        let store = InMemoryStore::new();
        let existing = Uuid::new_v4();
        store.apply(vec![insert(existing)]).await.unwrap();

        let event_id = EventId::new();
        let viewer = ViewerKey::resolve(None, "10.1.1.1").unwrap();
        let view = DocumentChange::CountView {
            record: ViewRecord::new(event_id, viewer, Utc::now()),
            window: DedupWindow::default(),
        };
        let stale = DocumentChange::Update {
            collection: "Test",
            id: existing,
            expected: Version::new(4),
            body: serde_json::json!({}),
        };

        let err = store.apply(vec![view.clone(), stale]).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 0);

        assert_eq!(store.apply(vec![view]).await.unwrap(), 1);
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeat_counted_view_fails_batch() {
        let store = InMemoryStore::new();
        let event_id = EventId::new();
        let viewer = ViewerKey::resolve(None, "10.1.1.2").unwrap();
        let record = ViewRecord::new(event_id, viewer, Utc::now());
        assert!(store.try_record(&record, DedupWindow::default()).await.unwrap());

        let fresh = Uuid::new_v4();
        let err = store
            .apply(vec![
                insert(fresh),
                DocumentChange::CountView {
                    record,
                    window: DedupWindow::default(),
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::ViewAlreadyCounted { .. }));
        assert!(!err.is_conflict());
        assert!(store.load("Test", fresh).await.unwrap().is_none());
        assert_eq!(store.view_count(event_id).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_views_count_once() {
        let store = InMemoryStore::new();
        let record = ViewRecord::new(
            EventId::new(),
            ViewerKey::resolve(None, "10.0.0.9").unwrap(),
            Utc::now(),
        );

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let record = record.clone();
            handles.push(tokio::spawn(async move {
                store.try_record(&record, DedupWindow::default()).await.unwrap()
            }));
        }

        let mut counted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                counted += 1;
            }
        }
        assert_eq!(counted, 1);
    }
}

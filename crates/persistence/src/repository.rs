use async_trait::async_trait;
use common::CancellationToken;
use domain::{AggregateRoot, DedupWindow, ViewRecord};
use tokio::sync::Mutex;

use crate::store::{DocumentChange, DocumentStore, StoredDocument};
use crate::{PersistenceError, Result};

/// Loads aggregates and stages changes to them for the next commit.
///
/// `add`, `update` and `remove` only stage; nothing is written until
/// [`UnitOfWork::commit`] runs.
#[async_trait]
pub trait Repository<A: AggregateRoot>: Send + Sync {
    /// Loads an aggregate, stamped with its stored version.
    async fn get_by_id(&self, id: A::Id, cancel: &CancellationToken) -> Result<Option<A>>;

    /// Loads every aggregate of this type.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<A>>;

    /// Stages a new aggregate.
    async fn add(&self, aggregate: &A) -> Result<()>;

    /// Stages the new state of a loaded aggregate.
    async fn update(&self, aggregate: &A) -> Result<()>;

    /// Stages removal of a loaded aggregate.
    async fn remove(&self, aggregate: &A) -> Result<()>;
}

/// The single atomic persistence boundary of one handler invocation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Writes every staged change atomically and returns how many documents
    /// were written. Staged changes are consumed either way.
    async fn commit(&self, cancel: &CancellationToken) -> Result<usize>;

    /// Returns true when changes are waiting to be committed.
    async fn has_changes(&self) -> bool;
}

/// One logical transaction over a [`DocumentStore`].
///
/// A session is both the repository for every aggregate type and the unit
/// of work that commits them. Create one per handler invocation.
pub struct Session<S: DocumentStore> {
    store: S,
    staged: Mutex<Vec<DocumentChange>>,
}

impl<S: DocumentStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            staged: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stages a counted view. The commit fails with `ViewAlreadyCounted`,
    /// writing nothing, when the viewer was already counted inside `window`.
    pub async fn count_view(&self, record: ViewRecord, window: DedupWindow) {
        self.stage(DocumentChange::CountView { record, window }).await;
    }

    async fn stage(&self, change: DocumentChange) {
        self.staged.lock().await.push(change);
    }

    fn decode<A: AggregateRoot>(document: StoredDocument) -> Result<A> {
        let mut aggregate: A = serde_json::from_value(document.body)?;
        aggregate.set_version(document.version);
        Ok(aggregate)
    }
}

#[async_trait]
impl<S, A> Repository<A> for Session<S>
where
    S: DocumentStore,
    A: AggregateRoot,
{
    async fn get_by_id(&self, id: A::Id, cancel: &CancellationToken) -> Result<Option<A>> {
        cancel.check()?;
        let document = self.store.load(A::aggregate_type(), id.into()).await?;
        document.map(Self::decode).transpose()
    }

    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<A>> {
        cancel.check()?;
        let documents = self.store.list(A::aggregate_type()).await?;
        documents.into_iter().map(Self::decode).collect()
    }

    async fn add(&self, aggregate: &A) -> Result<()> {
        let body = serde_json::to_value(aggregate)?;
        self.stage(DocumentChange::Insert {
            collection: A::aggregate_type(),
            id: aggregate.id().into(),
            body,
        })
        .await;
        Ok(())
    }

    async fn update(&self, aggregate: &A) -> Result<()> {
        let body = serde_json::to_value(aggregate)?;
        self.stage(DocumentChange::Update {
            collection: A::aggregate_type(),
            id: aggregate.id().into(),
            expected: aggregate.version(),
            body,
        })
        .await;
        Ok(())
    }

    async fn remove(&self, aggregate: &A) -> Result<()> {
        self.stage(DocumentChange::Delete {
            collection: A::aggregate_type(),
            id: aggregate.id().into(),
            expected: aggregate.version(),
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> UnitOfWork for Session<S> {
    async fn commit(&self, cancel: &CancellationToken) -> Result<usize> {
        let changes = std::mem::take(&mut *self.staged.lock().await);
        cancel.check()?;
        if changes.is_empty() {
            return Ok(0);
        }

        let count = changes.len();
        match self.store.apply(changes).await {
            Ok(written) => {
                metrics::counter!("unit_of_work_commits_total", "outcome" => "committed")
                    .increment(1);
                tracing::debug!(staged = count, written, "unit of work committed");
                Ok(written)
            }
            Err(e) => {
                let outcome = match &e {
                    PersistenceError::ViewAlreadyCounted { .. } => "deduplicated",
                    e if e.is_conflict() => "conflict",
                    _ => "failed",
                };
                metrics::counter!("unit_of_work_commits_total", "outcome" => outcome).increment(1);
                tracing::warn!(staged = count, error = %e, "unit of work commit failed");
                Err(e)
            }
        }
    }

    async fn has_changes(&self) -> bool {
        !self.staged.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use chrono::{Duration, Utc};
    use common::{EmailGroupId, Version};
    use domain::value_objects::{NewsletterDescription, NewsletterTitle};
    use domain::{Newsletter, NewsletterAudience};

    fn newsletter() -> Newsletter {
        Newsletter::create(
            NewsletterTitle::create("Monthly digest").unwrap(),
            NewsletterDescription::create("What happened this month.").unwrap(),
            common::UserId::new(),
            NewsletterAudience::email_groups(vec![EmailGroupId::new()]).unwrap(),
            None,
            false,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_nothing_is_written_before_commit() {
        let store = InMemoryStore::new();
        let session = Session::new(store.clone());
        let cancel = CancellationToken::new();
        let newsletter = newsletter();

        session.add(&newsletter).await.unwrap();
        assert!(session.has_changes().await);
        let loaded: Option<Newsletter> = session.get_by_id(newsletter.id(), &cancel).await.unwrap();
        assert!(loaded.is_none());

        assert_eq!(session.commit(&cancel).await.unwrap(), 1);
        assert!(!session.has_changes().await);
        let loaded: Option<Newsletter> = session.get_by_id(newsletter.id(), &cancel).await.unwrap();
        assert_eq!(loaded.unwrap().version(), Version::first());
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let newsletter = newsletter();
        let id = newsletter.id();

        let session = Session::new(store.clone());
        session.add(&newsletter).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let session = Session::new(store.clone());
        let mut loaded: Newsletter = session.get_by_id(id, &cancel).await.unwrap().unwrap();
        loaded.publish(Utc::now()).unwrap();
        session.update(&loaded).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let reloaded: Newsletter = Session::new(store)
            .get_by_id(id, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.version(), Version::new(2));
        assert!(reloaded.expires_at().unwrap() > Utc::now() + Duration::days(6));
        assert!(reloaded.pending_events().is_empty());
    }

    #[tokio::test]
    async fn test_stale_update_is_rejected() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let newsletter = newsletter();
        let id = newsletter.id();

        let session = Session::new(store.clone());
        session.add(&newsletter).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let first = Session::new(store.clone());
        let second = Session::new(store.clone());
        let mut a: Newsletter = first.get_by_id(id, &cancel).await.unwrap().unwrap();
        let mut b: Newsletter = second.get_by_id(id, &cancel).await.unwrap().unwrap();

        a.publish(Utc::now()).unwrap();
        first.update(&a).await.unwrap();
        first.commit(&cancel).await.unwrap();

        b.publish(Utc::now()).unwrap();
        second.update(&b).await.unwrap();
        let err = second.commit(&cancel).await.unwrap_err();
        assert!(matches!(err, PersistenceError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_commit_writes_nothing() {
        let store = InMemoryStore::new();
        let session = Session::new(store.clone());
        let cancel = CancellationToken::new();
        let newsletter = newsletter();

        session.add(&newsletter).await.unwrap();
        cancel.cancel();
        let err = session.commit(&cancel).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Cancelled(_)));
        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_document() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let newsletter = newsletter();
        let id = newsletter.id();

        let session = Session::new(store.clone());
        session.add(&newsletter).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let session = Session::new(store.clone());
        let loaded: Newsletter = session.get_by_id(id, &cancel).await.unwrap().unwrap();
        session.remove(&loaded).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let all: Vec<Newsletter> = session.list(&cancel).await.unwrap();
        assert!(all.is_empty());
    }
}

use async_trait::async_trait;
use common::{EventId, Version};
use domain::{DedupWindow, ViewRecord, ViewerKey};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::store::{DocumentChange, DocumentStore, StoredDocument, ViewRecordStore};
use crate::{PersistenceError, Result};

/// PostgreSQL-backed store.
///
/// Aggregates live in the `documents` table as JSONB keyed by
/// `(collection, id)`; the `version` column is the optimistic concurrency
/// token. View records live in `event_view_records`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<StoredDocument> {
        Ok(StoredDocument {
            id: row.try_get::<Uuid, _>("id")?,
            version: Version::new(row.try_get("version")?),
            body: row.try_get("body")?,
        })
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(version.map(Version::new))
    }

    async fn apply_change(tx: &mut Transaction<'_, Postgres>, change: &DocumentChange) -> Result<()> {
        match change {
            DocumentChange::Insert {
                collection,
                id,
                body,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, version, body)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(*collection)
                .bind(*id)
                .bind(Version::first().as_i64())
                .bind(body)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.constraint() == Some("documents_pkey")
                    {
                        return PersistenceError::DuplicateKey {
                            collection: collection.to_string(),
                            id: *id,
                        };
                    }
                    PersistenceError::Database(e)
                })?;
            }
            DocumentChange::Update {
                collection,
                id,
                expected,
                body,
            } => {
                let updated = sqlx::query(
                    r#"
                    UPDATE documents
                    SET body = $4, version = version + 1, updated_at = NOW()
                    WHERE collection = $1 AND id = $2 AND version = $3
                    "#,
                )
                .bind(*collection)
                .bind(*id)
                .bind(expected.as_i64())
                .bind(body)
                .execute(&mut **tx)
                .await?;
                if updated.rows_affected() == 0 {
                    return Err(Self::conflict(tx, collection, *id, *expected).await);
                }
            }
            DocumentChange::Delete {
                collection,
                id,
                expected,
            } => {
                let deleted = sqlx::query(
                    "DELETE FROM documents WHERE collection = $1 AND id = $2 AND version = $3",
                )
                .bind(*collection)
                .bind(*id)
                .bind(expected.as_i64())
                .execute(&mut **tx)
                .await?;
                if deleted.rows_affected() == 0 {
                    return Err(Self::conflict(tx, collection, *id, *expected).await);
                }
            }
            DocumentChange::CountView { record, window } => {
                if !Self::insert_view(tx, record, *window).await? {
                    return Err(PersistenceError::ViewAlreadyCounted {
                        event_id: record.event_id.as_uuid(),
                        viewer: record.viewer.as_key(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Inserts a view record unless the viewer was counted for the event
    /// within `window`. Returns whether the record was inserted.
    async fn insert_view(
        tx: &mut Transaction<'_, Postgres>,
        record: &ViewRecord,
        window: DedupWindow,
    ) -> Result<bool> {
        let viewer_key = record.viewer.as_key();

        // Serializes concurrent checks for the same event and viewer.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{}:{viewer_key}", record.event_id))
            .execute(&mut **tx)
            .await?;

        let last_view_at: Option<chrono::DateTime<chrono::Utc>> = sqlx::query_scalar(
            r#"
            SELECT MAX(viewed_at)
            FROM event_view_records
            WHERE event_id = $1 AND viewer_key = $2
            "#,
        )
        .bind(record.event_id.as_uuid())
        .bind(&viewer_key)
        .fetch_one(&mut **tx)
        .await?;

        if !window.should_count(last_view_at, record.viewed_at) {
            return Ok(false);
        }

        // The bucket constraint backs up the lock: one counted view per
        // viewer per window-sized slot.
        let inserted = sqlx::query(
            r#"
            INSERT INTO event_view_records (id, event_id, viewer_key, window_bucket, viewed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, viewer_key, window_bucket) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.event_id.as_uuid())
        .bind(&viewer_key)
        .bind(window.bucket(record.viewed_at))
        .bind(record.viewed_at)
        .execute(&mut **tx)
        .await?;

        Ok(inserted.rows_affected() == 1)
    }

    async fn conflict(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        id: Uuid,
        expected: Version,
    ) -> PersistenceError {
        match Self::current_version(tx, collection, id).await {
            Ok(actual) => PersistenceError::ConcurrencyConflict {
                collection: collection.to_string(),
                id,
                expected,
                actual,
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn load(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, version, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, body
            FROM documents
            WHERE collection = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn apply(&self, changes: Vec<DocumentChange>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for change in &changes {
            Self::apply_change(&mut tx, change).await?;
        }
        tx.commit().await?;
        Ok(changes.len())
    }
}

#[async_trait]
impl ViewRecordStore for PostgresStore {
    async fn try_record(&self, record: &ViewRecord, window: DedupWindow) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        if !Self::insert_view(&mut tx, record, window).await? {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn counted_views(&self, event_id: EventId, viewer: &ViewerKey) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_view_records WHERE event_id = $1 AND viewer_key = $2",
        )
        .bind(event_id.as_uuid())
        .bind(viewer.as_key())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

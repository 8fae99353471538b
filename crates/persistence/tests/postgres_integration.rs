//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p persistence --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{CancellationToken, EmailGroupId, EventId, UserId, Version};
use domain::value_objects::{NewsletterDescription, NewsletterTitle};
use domain::{
    AggregateRoot, DedupWindow, EventAnalytics, Newsletter, NewsletterAudience, NewsletterStatus,
    ViewRecord, ViewerKey,
};
use persistence::{
    DocumentChange, DocumentStore, PersistenceError, PostgresStore, Repository, Session,
    UnitOfWork, ViewRecordStore,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_documents.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/002_create_event_view_records.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents, event_view_records")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn now() -> DateTime<Utc> {
    "2026-05-10T09:00:00Z".parse().unwrap()
}

fn newsletter() -> Newsletter {
    Newsletter::create(
        NewsletterTitle::create("Temple clean-up day").unwrap(),
        NewsletterDescription::create("Volunteers needed on Saturday.").unwrap(),
        UserId::new(),
        NewsletterAudience::email_groups(vec![EmailGroupId::new()]).unwrap(),
        None,
        false,
        now(),
    )
    .unwrap()
}

async fn save_new(store: &PostgresStore, newsletter: &Newsletter) {
    let session = Session::new(store.clone());
    session.add(newsletter).await.unwrap();
    session.commit(&CancellationToken::new()).await.unwrap();
}

mod documents {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn add_and_load_aggregate() {
        let store = get_test_store().await;
        let newsletter = newsletter();
        save_new(&store, &newsletter).await;

        let session = Session::new(store.clone());
        let loaded: Newsletter = session
            .get_by_id(newsletter.id(), &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.version(), Version::first());
        assert_eq!(loaded.title(), newsletter.title());
        assert_eq!(loaded.status(), NewsletterStatus::Draft);
        assert!(loaded.pending_events().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn missing_aggregate_is_none() {
        let store = get_test_store().await;
        let session = Session::new(store);
        let loaded: Option<Newsletter> = session
            .get_by_id(common::NewsletterId::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn update_bumps_version() {
        let store = get_test_store().await;
        let newsletter = newsletter();
        save_new(&store, &newsletter).await;
        let cancel = CancellationToken::new();

        let session = Session::new(store.clone());
        let mut loaded: Newsletter = session
            .get_by_id(newsletter.id(), &cancel)
            .await
            .unwrap()
            .unwrap();
        loaded.publish(now()).unwrap();
        session.update(&loaded).await.unwrap();
        assert_eq!(session.commit(&cancel).await.unwrap(), 1);

        let document = store
            .load(Newsletter::aggregate_type(), newsletter.id().into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.version, Version::new(2));
        assert_eq!(document.body["status"], "Active");
    }

    #[tokio::test]
    #[serial]
    async fn stale_update_conflicts() {
        let store = get_test_store().await;
        let newsletter = newsletter();
        save_new(&store, &newsletter).await;
        let cancel = CancellationToken::new();

        let first = Session::new(store.clone());
        let second = Session::new(store.clone());
        let mut a: Newsletter = first.get_by_id(newsletter.id(), &cancel).await.unwrap().unwrap();
        let mut b: Newsletter = second.get_by_id(newsletter.id(), &cancel).await.unwrap().unwrap();

        a.publish(now()).unwrap();
        first.update(&a).await.unwrap();
        first.commit(&cancel).await.unwrap();

        b.publish(now()).unwrap();
        second.update(&b).await.unwrap();
        let err = second.commit(&cancel).await.unwrap_err();
        match err {
            PersistenceError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, Version::first());
                assert_eq!(actual, Some(Version::new(2)));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn duplicate_insert_is_rejected() {
        let store = get_test_store().await;
        let newsletter = newsletter();
        save_new(&store, &newsletter).await;

        let session = Session::new(store.clone());
        session.add(&newsletter).await.unwrap();
        let err = session.commit(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateKey { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn failed_batch_rolls_back() {
        let store = get_test_store().await;
        let existing = newsletter();
        save_new(&store, &existing).await;

        let fresh = Uuid::new_v4();
        let err = store
            .apply(vec![
                DocumentChange::Insert {
                    collection: "Newsletter",
                    id: fresh,
                    body: serde_json::json!({}),
                },
                DocumentChange::Delete {
                    collection: "Newsletter",
                    id: existing.id().into(),
                    expected: Version::new(9),
                },
            ])
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert!(store.load("Newsletter", fresh).await.unwrap().is_none());
    }

    #[tokio::test]
    #[serial]
    async fn list_returns_collection_only() {
        let store = get_test_store().await;
        save_new(&store, &newsletter()).await;
        save_new(&store, &newsletter()).await;

        let analytics = EventAnalytics::create(EventId::new(), now()).unwrap();
        let session = Session::new(store.clone());
        session.add(&analytics).await.unwrap();
        session.commit(&CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        let newsletters: Vec<Newsletter> = session.list(&cancel).await.unwrap();
        let analytics: Vec<EventAnalytics> = session.list(&cancel).await.unwrap();
        assert_eq!(newsletters.len(), 2);
        assert_eq!(analytics.len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn remove_deletes_row() {
        let store = get_test_store().await;
        let newsletter = newsletter();
        save_new(&store, &newsletter).await;
        let cancel = CancellationToken::new();

        let session = Session::new(store.clone());
        let loaded: Newsletter = session
            .get_by_id(newsletter.id(), &cancel)
            .await
            .unwrap()
            .unwrap();
        session.remove(&loaded).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}

mod views {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn repeat_view_inside_window_is_skipped() {
        let store = get_test_store().await;
        let event_id = EventId::new();
        let viewer = ViewerKey::resolve(Some(UserId::new()), "192.168.1.20").unwrap();
        let window = DedupWindow::default();

        let at = |secs| ViewRecord::new(event_id, viewer, now() + Duration::seconds(secs));
        assert!(store.try_record(&at(0), window).await.unwrap());
        assert!(!store.try_record(&at(60), window).await.unwrap());
        assert!(!store.try_record(&at(299), window).await.unwrap());
        assert!(store.try_record(&at(300), window).await.unwrap());
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn counted_view_commits_with_analytics_or_not_at_all() {
        let store = get_test_store().await;
        let event_id = EventId::new();
        let viewer = ViewerKey::resolve(None, "10.9.9.9").unwrap();
        let window = DedupWindow::default();
        let cancel = CancellationToken::new();

        let analytics = EventAnalytics::create(event_id, now()).unwrap();
        let session = Session::new(store.clone());
        session.add(&analytics).await.unwrap();
        session.commit(&cancel).await.unwrap();

        let mut stale: EventAnalytics = session
            .get_by_id(EventAnalytics::id_for(event_id), &cancel)
            .await
            .unwrap()
            .unwrap();
        stale.record_view(None, "10.9.9.9", now()).unwrap();
        let session = Session::new(store.clone());
        session.count_view(ViewRecord::new(event_id, viewer, now()), window).await;
        session.update(&stale).await.unwrap();
        session.commit(&cancel).await.unwrap();
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 1);

        // Same base version again: the analytics write conflicts.
        let later = now() + Duration::minutes(10);
        let session = Session::new(store.clone());
        session.count_view(ViewRecord::new(event_id, viewer, later), window).await;
        session.update(&stale).await.unwrap();
        let err = session.commit(&cancel).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.counted_views(event_id, &viewer).await.unwrap(), 1);

        let session = Session::new(store.clone());
        session.count_view(ViewRecord::new(event_id, viewer, now()), window).await;
        let err = session.commit(&cancel).await.unwrap_err();
        assert!(matches!(err, PersistenceError::ViewAlreadyCounted { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn viewers_are_counted_separately() {
        let store = get_test_store().await;
        let event_id = EventId::new();
        let window = DedupWindow::default();

        let first = ViewerKey::resolve(None, "10.0.0.1").unwrap();
        let second = ViewerKey::resolve(None, "10.0.0.2").unwrap();
        assert!(store.try_record(&ViewRecord::new(event_id, first, now()), window).await.unwrap());
        assert!(store.try_record(&ViewRecord::new(event_id, second, now()), window).await.unwrap());
        assert!(
            store
                .try_record(&ViewRecord::new(EventId::new(), first, now()), window)
                .await
                .unwrap()
        );
        assert_eq!(store.counted_views(event_id, &first).await.unwrap(), 1);
        assert_eq!(store.counted_views(event_id, &second).await.unwrap(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn concurrent_views_count_once() {
        let store = get_test_store().await;
        let record = ViewRecord::new(
            EventId::new(),
            ViewerKey::resolve(None, "172.16.0.4").unwrap(),
            now(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
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

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_view_records")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}

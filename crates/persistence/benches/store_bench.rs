use chrono::{Duration, Utc};
use common::{CancellationToken, EmailGroupId, EventId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::value_objects::{NewsletterDescription, NewsletterTitle};
use domain::{DedupWindow, Newsletter, NewsletterAudience, ViewRecord, ViewerKey};
use persistence::{InMemoryStore, Repository, Session, UnitOfWork, ViewRecordStore};

fn newsletter() -> Newsletter {
    Newsletter::create(
        NewsletterTitle::create("Weekly notes").unwrap(),
        NewsletterDescription::create("Updates from the committee.").unwrap(),
        UserId::new(),
        NewsletterAudience::email_groups(vec![EmailGroupId::new()]).unwrap(),
        None,
        false,
        Utc::now(),
    )
    .unwrap()
}

fn bench_commit_single_aggregate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cancel = CancellationToken::new();

    c.bench_function("session/commit_single_aggregate", |b| {
        b.iter(|| {
            rt.block_on(async {
                let session = Session::new(InMemoryStore::new());
                session.add(&newsletter()).await.unwrap();
                session.commit(&cancel).await.unwrap();
            });
        });
    });
}

fn bench_load_and_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cancel = CancellationToken::new();
    let store = InMemoryStore::new();
    let newsletter = newsletter();
    let id = domain::AggregateRoot::id(&newsletter);

    rt.block_on(async {
        let session = Session::new(store.clone());
        session.add(&newsletter).await.unwrap();
        session.commit(&cancel).await.unwrap();
    });

    c.bench_function("session/load_and_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let session = Session::new(store.clone());
                let loaded: Newsletter = session.get_by_id(id, &cancel).await.unwrap().unwrap();
                session.update(&loaded).await.unwrap();
                session.commit(&cancel).await.unwrap();
            });
        });
    });
}

fn bench_record_views(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("views/record_100_viewers", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let event_id = EventId::new();
                let start = Utc::now();
                for i in 0..100u8 {
                    let viewer = ViewerKey::resolve(None, &format!("10.0.1.{i}")).unwrap();
                    let record =
                        ViewRecord::new(event_id, viewer, start + Duration::milliseconds(i.into()));
                    store
                        .try_record(&record, DedupWindow::default())
                        .await
                        .unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_commit_single_aggregate,
    bench_load_and_update,
    bench_record_views,
);
criterion_main!(benches);

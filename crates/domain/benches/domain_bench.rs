use chrono::{Duration, Utc};
use common::{EventId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::value_objects::{
    Address, ContactInformation, DateRange, EventDescription, EventTitle, Money,
};
use domain::{AggregateRoot, Event, EventAnalytics, EventCategory, EventDetails};

fn bench_value_objects(c: &mut Criterion) {
    c.bench_function("domain/event_title", |b| {
        b.iter(|| EventTitle::create("  Sinhala and Tamil New Year Festival  ").unwrap());
    });

    c.bench_function("domain/contact_information", |b| {
        b.iter(|| {
            ContactInformation::create(
                Some("Info@Example.com"),
                Some("+1 (416) 555-0100"),
                Some("https://example.com/about"),
            )
            .unwrap()
        });
    });

    c.bench_function("domain/address_invalid", |b| {
        b.iter(|| Address::create("", "", "ON", "", "Canada").unwrap_err());
    });
}

fn bench_event_registrations(c: &mut Criterion) {
    let now = Utc::now();
    let start = now + Duration::days(30);
    let details = EventDetails {
        title: EventTitle::create("Community Picnic").unwrap(),
        description: EventDescription::create("Bring the family.").unwrap(),
        schedule: DateRange::create(start, start + Duration::hours(5)).unwrap(),
        capacity: 1_000,
        category: EventCategory::Community,
        ticket_price: Some(Money::create(1500, "CAD").unwrap()),
    };

    c.bench_function("domain/register_500", |b| {
        b.iter(|| {
            let mut event = Event::create(UserId::new(), details.clone(), now).unwrap();
            event.publish(now).unwrap();
            for _ in 0..500 {
                event.register(UserId::new(), 1, now).unwrap();
            }
            event.take_events()
        });
    });
}

fn bench_record_views(c: &mut Criterion) {
    let now = Utc::now();

    c.bench_function("domain/record_100_views", |b| {
        b.iter(|| {
            let mut analytics = EventAnalytics::create(EventId::new(), now).unwrap();
            for i in 0..100 {
                let ip = format!("10.0.0.{}", i % 250);
                analytics.record_view(None, &ip, now).unwrap();
            }
            analytics.conversion_rate()
        });
    });
}

criterion_group!(
    benches,
    bench_value_objects,
    bench_event_registrations,
    bench_record_views,
);
criterion_main!(benches);

//! Performance benchmarks for the data repository.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;
use udr::notify::DEFAULT_DELIVERY_BUFFER;
use udr::{
    apply_patch, DataRepository, DataResource, FilterCriteria, InfluenceDataQuery, MemoryStore,
    NewSubscription, OwnerKey, PatchItem, QueryParams, SubscriptionClass, SubscriptionNotifier,
    SubscriptionRegistry,
};

const API_ROOT: &str = "http://udr:8000/nudr-dr/v1";

fn create_repo(watchers: usize) -> (DataRepository, crossbeam_channel::Receiver<udr::Delivery>) {
    let registry = Arc::new(SubscriptionRegistry::new());
    let (notifier, deliveries) =
        SubscriptionNotifier::new(Arc::clone(&registry), DEFAULT_DELIVERY_BUFFER);
    let repo = DataRepository::new(
        Arc::new(MemoryStore::new()),
        registry,
        Arc::new(notifier),
        API_ROOT,
    );

    let uri = repo
        .pipeline()
        .resource_uri(&OwnerKey::subscriber("imsi-1"), DataResource::PpData);
    for i in 0..watchers {
        repo.create_subscription(
            &OwnerKey::Global,
            SubscriptionClass::SubscriptionDataChange,
            NewSubscription::new(format!("http://nf-{}/cb", i)).with_filter(FilterCriteria {
                ue_id: None,
                monitored_resource_uris: vec![uri.clone()],
            }),
        );
    }
    (repo, deliveries)
}

/// Subscription creation across many owners
fn bench_subscription_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscription_create");

    for owners in [1, 100, 10_000] {
        group.bench_with_input(BenchmarkId::new("owners", owners), &owners, |b, &owners| {
            let registry = SubscriptionRegistry::new();
            let mut n = 0usize;
            b.iter(|| {
                n += 1;
                let owner = OwnerKey::subscriber(format!("imsi-{}", n % owners));
                black_box(registry.create(&owner, SubscriptionClass::Sdm, NewSubscription::new("cb")));
            });
        });
    }

    group.finish();
}

/// Ordered patch application on documents of growing size
fn bench_apply_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_patch");

    for fields in [10, 100, 1000] {
        let doc = json!((0..fields)
            .map(|i| (format!("f{}", i), json!({"value": i})))
            .collect::<serde_json::Map<_, _>>());
        let items = vec![
            PatchItem::test("/f0/value", json!(0)),
            PatchItem::replace("/f1/value", json!(42)),
            PatchItem::add("/extra", json!([1, 2, 3])),
        ];

        group.bench_with_input(BenchmarkId::new("fields", fields), &doc, |b, doc| {
            b.iter(|| black_box(apply_patch(doc, &items).unwrap()));
        });
    }

    group.finish();
}

/// Patch plus notification fan-out with a varying number of watchers
fn bench_patch_with_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_fanout");

    for watchers in [0, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("watchers", watchers),
            &watchers,
            |b, &watchers| {
                let (repo, deliveries) = create_repo(watchers);
                repo.put(
                    "imsi-1",
                    DataResource::PpData,
                    json!({"n": 0}).as_object().cloned().unwrap(),
                )
                .unwrap();

                let mut n = 0;
                b.iter(|| {
                    n += 1;
                    repo.patch(
                        "imsi-1",
                        DataResource::PpData,
                        &[PatchItem::replace("/n", json!(n))],
                    )
                    .unwrap();
                    for d in deliveries.try_iter() {
                        black_box(d);
                    }
                });
            },
        );
    }

    group.finish();
}

/// Influence data query over a populated collection
fn bench_influence_query(c: &mut Criterion) {
    let (repo, _) = create_repo(0);
    for i in 0..1000 {
        repo.put_influence_data(
            &format!("infl-{}", i),
            json!({
                "afAppId": "app",
                "dnn": if i % 2 == 0 { "internet" } else { "ims" },
                "snssai": {"sst": (i % 4) + 1, "sd": "010203"},
                "supi": format!("imsi-{}", i),
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .unwrap();
    }

    let params: QueryParams = [
        ("dnns".to_string(), vec!["internet".to_string()]),
        (
            "snssais".to_string(),
            vec![r#"{"sst":1,"sd":"010203"}"#.to_string()],
        ),
    ]
    .into_iter()
    .collect();
    let query = InfluenceDataQuery::from_params(&params).unwrap();

    c.bench_function("influence_query_1000", |b| {
        b.iter(|| black_box(repo.query_influence_data(&query).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_subscription_create,
    bench_apply_patch,
    bench_patch_with_fanout,
    bench_influence_query,
);
criterion_main!(benches);

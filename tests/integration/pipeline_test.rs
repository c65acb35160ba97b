// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{options, two_load_backend, FakeApi, Reply};
use harvestrs::domain::models::collection::{Collection, RecordKey};
use harvestrs::domain::models::outcome::RunOutcome;
use harvestrs::domain::repositories::cache_repository::CacheStore;
use harvestrs::infrastructure::storage::{InMemoryCacheStore, LocalCacheStore};
use harvestrs::workers::PipelineManager;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn key(raw: &str) -> RecordKey {
    RecordKey::parse(raw).unwrap()
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    for collection in Collection::ALL {
        let dir = root.join(collection.dir_name());
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries {
            let entry = entry.unwrap();
            let name = format!(
                "{}/{}",
                collection.dir_name(),
                entry.file_name().to_string_lossy()
            );
            files.insert(name, std::fs::read(entry.path()).unwrap());
        }
    }
    files
}

#[tokio::test]
async fn test_end_to_end_two_loads() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(two_load_backend());
    let store = Arc::new(LocalCacheStore::new(dir.path()));
    let manager = PipelineManager::new(api.clone(), store.clone(), options(3));

    let outcome = manager.run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(outcome.reports().len(), 6);
    for (collection, expected) in [
        (Collection::Pages, 1),
        (Collection::Loads, 2),
        (Collection::TravelOrders, 1),
        (Collection::Trucks, 1),
        (Collection::Owners, 1),
        (Collection::Customers, 1),
    ] {
        assert_eq!(
            store.list_keys(collection).await.unwrap().len(),
            expected,
            "{}",
            collection
        );
    }
    assert!(dir.path().join("pages/sp_loads_page_1.json").is_file());
    assert!(dir.path().join("load_details/load_L2.json").is_file());

    let stored = store.get(Collection::Owners, &key("O1")).await.unwrap().unwrap();
    assert_eq!(stored.payload, json!({"id": "O1"}));
}

#[tokio::test]
async fn test_second_run_issues_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalCacheStore::new(dir.path()));

    let first_api = Arc::new(two_load_backend());
    PipelineManager::new(first_api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();
    let after_first = snapshot(dir.path());
    assert_eq!(first_api.call_count(), 7);

    let second_api = Arc::new(two_load_backend());
    let outcome = PipelineManager::new(second_api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(!outcome.is_aborted());
    assert_eq!(second_api.call_count(), 0, "{:?}", second_api.calls());
    assert_eq!(snapshot(dir.path()), after_first);
    assert!(outcome.reports().iter().all(|r| r.stored == 0));
}

#[tokio::test]
async fn test_concurrency_never_exceeds_gate_limit() {
    for limit in [1usize, 2, 5] {
        let travel_orders: Vec<_> = (0..12)
            .map(|i| json!({"number": format!("T{}", i), "truck": {"number": format!("TR{}", i)}}))
            .collect();
        let mut api = FakeApi::new()
            .delay(Duration::from_millis(15))
            .page(1, Reply::Json(json!([{"number": "L1"}])))
            .detail(
                "/api/sp-loads/L1",
                Reply::Json(json!({"number": "L1", "travelOrders": travel_orders})),
            );
        for i in 0..12 {
            api = api.detail(
                &format!("/api/travel-order/T{}", i),
                Reply::Json(json!({"number": format!("T{}", i)})),
            );
        }
        let api = Arc::new(api);
        let store = Arc::new(InMemoryCacheStore::new());

        let outcome = PipelineManager::new(api.clone(), store.clone(), options(limit))
            .run()
            .await
            .unwrap();

        assert!(!outcome.is_aborted());
        assert_eq!(store.len(Collection::TravelOrders).await, 12);
        assert_eq!(api.max_in_flight(), limit, "limit {}", limit);
    }
}

#[tokio::test]
async fn test_extraction_selects_expected_keys() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}])))
            .detail(
                "/api/sp-loads/L1",
                Reply::Json(json!({
                    "number": "L1",
                    "travelOrders": [
                        {"number": "T1", "truck": {"number": "TR1"}},
                        {"number": "T2", "truck": {"number": "TR2"}}
                    ],
                    "bookedByDispatcher": {"id": "O1"},
                    "bookedWithCustomer": {"id": "C1"}
                })),
            ),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    PipelineManager::new(api.clone(), store, options(2))
        .run()
        .await
        .unwrap();

    let mut travel_orders = api.calls_to("GET /api/travel-order/");
    travel_orders.sort();
    assert_eq!(
        travel_orders,
        vec!["GET /api/travel-order/T1", "GET /api/travel-order/T2"]
    );
    assert_eq!(
        api.calls_to("GET /api/trucks/"),
        vec!["GET /api/trucks/search/TR1"]
    );
    assert_eq!(api.calls_to("GET /api/owners/"), vec!["GET /api/owners/O1"]);
    assert_eq!(
        api.calls_to("GET /api/customers/"),
        vec!["GET /api/customers/C1"]
    );
}

#[tokio::test]
async fn test_shared_reference_fetched_once() {
    let api = Arc::new(
        FakeApi::new()
            .page(
                1,
                Reply::Json(json!([{"number": "L1"}, {"number": "L2"}, {"number": "L1"}])),
            )
            .detail(
                "/api/sp-loads/L1",
                Reply::Json(json!({"travelOrders": [{"number": "T1"}], "bookedWithCustomer": {"id": "C1"}})),
            )
            .detail(
                "/api/sp-loads/L2",
                Reply::Json(json!({"travelOrders": [{"number": "T1"}], "bookedWithCustomer": {"id": "C1"}})),
            )
            .detail("/api/travel-order/T1", Reply::Json(json!({"number": "T1"})))
            .detail("/api/customers/C1", Reply::Json(json!({"id": "C1"}))),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    PipelineManager::new(api.clone(), store, options(3))
        .run()
        .await
        .unwrap();

    assert_eq!(api.calls_to("GET /api/sp-loads/L1").len(), 1);
    assert_eq!(api.calls_to("GET /api/travel-order/T1").len(), 1);
    assert_eq!(api.calls_to("GET /api/customers/C1").len(), 1);
}

#[tokio::test]
async fn test_unauthorized_aborts_remaining_stages() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}, {"number": "L2"}])))
            .detail("/api/sp-loads/L1", Reply::Status(401))
            .detail("/api/sp-loads/L2", Reply::Status(401)),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    let outcome = PipelineManager::new(api.clone(), store.clone(), options(1))
        .run()
        .await
        .unwrap();

    match &outcome {
        RunOutcome::Aborted { stage, reason, reports } => {
            assert_eq!(stage, "load_details");
            assert!(reason.contains("401"));
            assert_eq!(reports.len(), 2);
            // With one slot, the second load never gets admitted.
            assert_eq!(reports[1].cancelled, 1);
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(api.calls_to("GET /api/sp-loads/").len(), 1);
    assert!(api.calls_to("GET /api/travel-order/").is_empty());
    assert!(api.calls_to("GET /api/owners/").is_empty());
    assert_eq!(store.len(Collection::Loads).await, 0);
    assert_eq!(store.len(Collection::Pages).await, 1);
}

#[tokio::test]
async fn test_forbidden_listing_aborts_before_details() {
    let api = Arc::new(FakeApi::new().page(1, Reply::Status(403)));
    let store = Arc::new(InMemoryCacheStore::new());

    let outcome = PipelineManager::new(api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(outcome.is_aborted());
    assert_eq!(outcome.reports().len(), 1);
    assert_eq!(api.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_error_pauses_and_drops() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}])))
            .detail("/api/sp-loads/L1", Reply::Status(503)),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    let started = tokio::time::Instant::now();
    let outcome = PipelineManager::new(api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(!outcome.is_aborted());
    let loads = outcome.report_for(Collection::Loads).unwrap();
    assert_eq!(loads.paused, 1);
    assert_eq!(loads.stored, 0);
    assert!(!store.exists(Collection::Loads, &key("L1")).await.unwrap());
    assert_eq!(api.calls_to("GET /api/sp-loads/L1").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abort_cuts_short_a_sibling_pause() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}, {"number": "L2"}])))
            .detail("/api/sp-loads/L1", Reply::Status(503))
            .detail("/api/sp-loads/L2", Reply::Status(401)),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    let started = tokio::time::Instant::now();
    let outcome = PipelineManager::new(api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(outcome.is_aborted());
    let loads = outcome.report_for(Collection::Loads).unwrap();
    assert_eq!(loads.paused, 1);
    assert!(loads.is_aborted());
    assert!(api.calls_to("GET /api/travel-order/").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_not_found_skips_without_pause() {
    let api = Arc::new(FakeApi::new().page(1, Reply::Json(json!([{"number": "L1"}]))));
    let store = Arc::new(InMemoryCacheStore::new());

    let started = tokio::time::Instant::now();
    let outcome = PipelineManager::new(api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(!outcome.is_aborted());
    let loads = outcome.report_for(Collection::Loads).unwrap();
    assert_eq!(loads.skipped, 1);
    assert_eq!(loads.paused, 0);
    assert_eq!(store.len(Collection::Loads).await, 0);
}

#[tokio::test]
async fn test_empty_page_is_retried_next_run() {
    let api = Arc::new(FakeApi::new().page(1, Reply::Json(json!([]))));
    let store = Arc::new(InMemoryCacheStore::new());
    let manager = PipelineManager::new(api.clone(), store.clone(), options(2));

    let outcome = manager.run().await.unwrap();
    let pages = outcome.report_for(Collection::Pages).unwrap();
    assert_eq!(pages.skipped, 1);
    assert_eq!(pages.stored, 0);
    assert_eq!(store.len(Collection::Pages).await, 0);

    manager.run().await.unwrap();
    assert_eq!(api.calls_to("POST /api/sp-loads").len(), 2);
}

#[tokio::test]
async fn test_transport_and_decode_failures_are_skipped() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}, {"number": "L2"}, {"number": "L3"}])))
            .detail("/api/sp-loads/L1", Reply::Disconnect)
            .detail("/api/sp-loads/L2", Reply::Raw(200, "<html>".to_string()))
            .detail("/api/sp-loads/L3", Reply::Json(json!({"number": "L3"}))),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    let outcome = PipelineManager::new(api.clone(), store.clone(), options(3))
        .run()
        .await
        .unwrap();

    assert!(!outcome.is_aborted());
    let loads = outcome.report_for(Collection::Loads).unwrap();
    assert_eq!(loads.skipped, 2);
    assert_eq!(loads.stored, 1);
    assert_eq!(
        store.list_keys(Collection::Loads).await.unwrap(),
        vec![key("L3")]
    );
}

#[tokio::test]
async fn test_cached_key_is_not_requested() {
    let api = Arc::new(two_load_backend());
    let store = Arc::new(InMemoryCacheStore::new());
    store
        .put(Collection::Owners, &key("O1"), &json!({"id": "O1", "seeded": true}))
        .await
        .unwrap();

    let outcome = PipelineManager::new(api.clone(), store.clone(), options(2))
        .run()
        .await
        .unwrap();

    assert!(api.calls_to("GET /api/owners/").is_empty());
    assert_eq!(outcome.report_for(Collection::Owners).unwrap().cached, 1);
    let owner = store.get(Collection::Owners, &key("O1")).await.unwrap().unwrap();
    assert_eq!(owner.payload["seeded"], json!(true));
}

#[tokio::test]
async fn test_corrupt_upstream_record_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("pages")).unwrap();
    std::fs::write(dir.path().join("pages/sp_loads_page_1.json"), "[{\"number\": ").unwrap();

    let api = Arc::new(FakeApi::new().page(2, Reply::Json(json!([{"number": "L2"}]))));
    let store = Arc::new(LocalCacheStore::new(dir.path()));
    let mut opts = options(2);
    opts.listing.page_count = 1;

    let outcome = PipelineManager::new(api.clone(), store, opts)
        .run()
        .await
        .unwrap();

    assert!(!outcome.is_aborted());
    assert_eq!(api.calls_to("POST /api/sp-loads").len(), 1);
    assert_eq!(api.calls_to("GET /api/sp-loads/"), vec!["GET /api/sp-loads/L2"]);
}

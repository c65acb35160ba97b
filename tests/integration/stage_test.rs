// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{options, FakeApi, Reply};
use harvestrs::domain::models::collection::{Collection, RecordKey};
use harvestrs::domain::repositories::cache_repository::CacheStore;
use harvestrs::domain::services::extraction::ExtractionRule;
use harvestrs::infrastructure::storage::InMemoryCacheStore;
use harvestrs::workers::detail_worker::DetailFetcher;
use harvestrs::workers::executor::FetchExecutor;
use harvestrs::workers::gate::ConcurrencyGate;
use harvestrs::workers::listing_worker::ListingFetcher;
use harvestrs::workers::{PipelineManager, StageSpec};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn executor(api: Arc<FakeApi>, store: Arc<InMemoryCacheStore>, limit: usize) -> FetchExecutor {
    FetchExecutor::new(
        api,
        store,
        ConcurrencyGate::new(limit),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_listing_range_is_inclusive_and_skips_cached_pages() {
    let api = Arc::new(
        FakeApi::new()
            .page(3, Reply::Json(json!([{"number": "L3"}])))
            .page(5, Reply::Json(json!([{"number": "L5"}]))),
    );
    let store = Arc::new(InMemoryCacheStore::new());
    store
        .put(Collection::Pages, &RecordKey::from(4), &json!([]))
        .await
        .unwrap();

    let exec = executor(api.clone(), store.clone(), 2);
    let settings = options(2).listing;
    let report = ListingFetcher::new(&exec, &settings).run(3, 2).await.unwrap();

    assert_eq!(report.discovered, 3);
    assert_eq!(report.cached, 1);
    assert_eq!(report.scheduled, 2);
    assert_eq!(report.stored, 2);
    let mut calls = api.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec!["POST /api/sp-loads page=3", "POST /api/sp-loads page=5"]
    );
    assert_eq!(store.len(Collection::Pages).await, 3);
}

#[tokio::test]
async fn test_detail_stage_reads_only_its_source_collection() {
    let api = Arc::new(FakeApi::new().detail("/api/owners/O9", Reply::Json(json!({"id": "O9"}))));
    let store = Arc::new(InMemoryCacheStore::new());
    store
        .put(
            Collection::Loads,
            &RecordKey::parse("L1").unwrap(),
            &json!({"bookedByDispatcher": {"id": "O9"}}),
        )
        .await
        .unwrap();
    // A page that would yield an owner key if it were read as a load.
    store
        .put(
            Collection::Pages,
            &RecordKey::from(1),
            &json!({"bookedByDispatcher": {"id": "O1"}}),
        )
        .await
        .unwrap();

    let exec = executor(api.clone(), store.clone(), 1);
    let report = DetailFetcher::new(&exec)
        .run(Collection::Loads, ExtractionRule::DispatcherId)
        .await
        .unwrap();

    assert_eq!(report.stage, "owner_details");
    assert_eq!(report.stored, 1);
    assert_eq!(api.calls(), vec!["GET /api/owners/O9"]);
}

#[tokio::test]
async fn test_abort_cancels_tasks_not_yet_admitted() {
    let mut api = FakeApi::new().delay(Duration::from_millis(5));
    let store = Arc::new(InMemoryCacheStore::new());
    let orders: Vec<_> = (0..6).map(|i| json!({"number": format!("T{}", i)})).collect();
    store
        .put(
            Collection::Loads,
            &RecordKey::parse("L1").unwrap(),
            &json!({"travelOrders": orders}),
        )
        .await
        .unwrap();
    for i in 0..6 {
        api = api.detail(&format!("/api/travel-order/T{}", i), Reply::Status(403));
    }
    let api = Arc::new(api);

    let exec = executor(api.clone(), store.clone(), 2);
    let report = DetailFetcher::new(&exec)
        .run(Collection::Loads, ExtractionRule::TravelOrderNumbers)
        .await
        .unwrap();

    assert!(report.is_aborted());
    // The two tasks in flight when the abort landed finish; nothing else is admitted.
    assert_eq!(api.call_count(), 2);
    assert_eq!(report.cancelled, 4);
    assert!(exec.gate().is_closed());
}

#[tokio::test]
async fn test_manager_with_custom_stages() {
    let api = Arc::new(
        FakeApi::new()
            .page(1, Reply::Json(json!([{"number": "L1"}])))
            .detail("/api/sp-loads/L1", Reply::Json(json!({"bookedWithCustomer": {"id": "C1"}})))
            .detail("/api/customers/C1", Reply::Json(json!({"id": "C1"}))),
    );
    let store = Arc::new(InMemoryCacheStore::new());

    let manager = PipelineManager::new(api.clone(), store.clone(), options(2)).with_stages(vec![
        StageSpec::new(Collection::Pages, ExtractionRule::LoadNumbers),
        StageSpec::new(Collection::Loads, ExtractionRule::CustomerId),
    ]);
    let outcome = manager.run().await.unwrap();

    let stages: Vec<_> = outcome.reports().iter().map(|r| r.stage.as_str()).collect();
    assert_eq!(stages, vec!["pages", "load_details", "customer_details"]);
    assert_eq!(store.len(Collection::Customers).await, 1);
    assert!(api.calls_to("GET /api/owners/").is_empty());
}

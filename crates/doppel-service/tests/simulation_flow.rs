//! End-to-end simulation flows over the in-memory adapter.

use chrono::{TimeZone, Utc};
use doppel_service::{HarnessConfig, SimulationService};
use doppel_storage::memory::InMemorySimulatorStorage;
use doppel_storage::{EndpointStore, EnvironmentStore, QueryWindow, SimulatorStorage};
use doppel_types::{
    Clock, Environment, FixedClock, HttpMethod, RequestSnapshot, SimulatedEndpoint, TransformOp,
    TransformProgram,
};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    service: SimulationService,
    storage: Arc<InMemorySimulatorStorage>,
    environment: Environment,
}

async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let storage = Arc::new(InMemorySimulatorStorage::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
    ));
    let environment = Environment::new("staging", "https://orchestrator.test", clock.now());
    storage
        .upsert_environment(environment.clone())
        .await
        .expect("must store environment");

    let service = SimulationService::new(
        storage.clone() as Arc<dyn SimulatorStorage>,
        clock,
        &HarnessConfig::with_seed(99),
    );
    Harness {
        service,
        storage,
        environment,
    }
}

fn order_endpoint(h: &Harness) -> SimulatedEndpoint {
    SimulatedEndpoint::new(
        h.environment.id,
        HttpMethod::Post,
        "/orders",
        json!({
            "order_id": "{{request.body.order_id}}",
            "status": "accepted"
        }),
        Utc::now(),
    )
}

fn order_request() -> RequestSnapshot {
    RequestSnapshot::new(HttpMethod::Post, "/orders").with_body(json!({"order_id": "ord-77"}))
}

#[tokio::test]
async fn matched_dispatch_renders_logs_and_records_the_probe() {
    let h = harness().await;
    let endpoint = order_endpoint(&h);
    h.storage
        .upsert_endpoint(endpoint.clone())
        .await
        .expect("must store endpoint");

    let result = h
        .service
        .dispatch(&h.environment.id, order_request())
        .await
        .expect("dispatch must succeed");

    assert_eq!(result.response.status, 200);
    assert_eq!(result.response.body["order_id"], "ord-77");
    assert_eq!(result.endpoint_id, Some(endpoint.id));

    let calls = h
        .service
        .call_log(QueryWindow::default())
        .await
        .expect("must read call log");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].correlation_id, result.correlation_id);
    assert_eq!(calls[0].response_status, 200);
    assert!(!calls[0].error_injected);

    let probed = h
        .storage
        .get_endpoint(&endpoint.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(probed.last_test_status, Some(200));
    assert!(probed.last_tested_at.is_some());
}

#[tokio::test]
async fn unmatched_dispatch_serves_the_not_configured_fixture_and_still_logs() {
    let h = harness().await;

    let result = h
        .service
        .dispatch(&h.environment.id, order_request())
        .await
        .expect("dispatch must succeed");

    assert_eq!(result.response.status, 404);
    assert_eq!(
        result.response.body["error"],
        "No simulated endpoint configured"
    );
    assert_eq!(result.endpoint_id, None);

    let calls = h.service.call_log(QueryWindow::default()).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint_id, None);
}

#[tokio::test]
async fn disabled_endpoints_are_treated_as_unmatched() {
    let h = harness().await;
    let mut endpoint = order_endpoint(&h);
    endpoint.enabled = false;
    h.storage.upsert_endpoint(endpoint).await.unwrap();

    let result = h
        .service
        .dispatch(&h.environment.id, order_request())
        .await
        .unwrap();
    assert_eq!(result.response.status, 404);
    assert_eq!(result.endpoint_id, None);
}

#[tokio::test]
async fn full_error_rate_always_serves_the_failure_fixture() {
    let h = harness().await;
    let mut endpoint = order_endpoint(&h);
    endpoint.error_rate_percent = 100.0;
    h.storage.upsert_endpoint(endpoint.clone()).await.unwrap();

    for _ in 0..20 {
        let result = h
            .service
            .dispatch(&h.environment.id, order_request())
            .await
            .unwrap();
        assert_eq!(result.response.status, 500);
        assert_eq!(result.response.body["simulated"], true);
        assert!(result.error_injected);
    }

    // Fixtures are flagged in the log, distinguishable from real failures.
    let calls = h
        .service
        .calls_for_endpoint(&endpoint.id, QueryWindow::default())
        .await
        .unwrap();
    assert_eq!(calls.len(), 20);
    assert!(calls.iter().all(|c| c.error_injected));
}

#[tokio::test]
async fn zero_error_rate_never_serves_the_failure_fixture() {
    let h = harness().await;
    let endpoint = order_endpoint(&h);
    h.storage.upsert_endpoint(endpoint).await.unwrap();

    for _ in 0..20 {
        let result = h
            .service
            .dispatch(&h.environment.id, order_request())
            .await
            .unwrap();
        assert_eq!(result.response.status, 200);
        assert!(!result.error_injected);
    }
}

#[tokio::test]
async fn every_dispatch_appends_one_hash_chained_row() {
    let h = harness().await;
    let endpoint = order_endpoint(&h);
    h.storage.upsert_endpoint(endpoint).await.unwrap();

    for _ in 0..3 {
        h.service
            .dispatch(&h.environment.id, order_request())
            .await
            .unwrap();
    }
    // One unmatched call logs too.
    h.service
        .dispatch(
            &h.environment.id,
            RequestSnapshot::new(HttpMethod::Get, "/nowhere"),
        )
        .await
        .unwrap();

    let calls = h.service.call_log(QueryWindow::default()).await.unwrap();
    assert_eq!(calls.len(), 4);

    // Newest-first; each row links to its predecessor.
    for pair in calls.windows(2) {
        assert_eq!(pair[0].sequence, pair[1].sequence + 1);
        assert_eq!(pair[0].previous_hash, Some(pair[1].hash.clone()));
    }
    assert_eq!(calls[3].previous_hash, None);
}

#[tokio::test]
async fn transform_program_runs_and_failures_degrade_to_the_raw_template() {
    let h = harness().await;

    let mut shaped = order_endpoint(&h);
    shaped.transform = Some(TransformProgram::new(vec![
        TransformOp::SetStatus { status: 201 },
        TransformOp::CopyRequestField {
            source: doppel_types::RequestSource::Query,
            field: "tenant".to_string(),
            to: "tenant".to_string(),
        },
    ]));
    h.storage.upsert_endpoint(shaped.clone()).await.unwrap();

    let request = order_request().with_query("tenant", "acme");
    let result = h
        .service
        .execute_endpoint(&shaped.id, request)
        .await
        .unwrap();
    assert_eq!(result.response.status, 201);
    assert_eq!(result.response.body["tenant"], "acme");
    assert!(result.transform_applied);

    // A program that violates its own rules is swallowed, not surfaced.
    let mut broken = order_endpoint(&h);
    broken.path = "/orders/broken".to_string();
    broken.transform = Some(TransformProgram::new(vec![TransformOp::SetStatus {
        status: 7,
    }]));
    h.storage.upsert_endpoint(broken.clone()).await.unwrap();

    let result = h
        .service
        .execute_endpoint(&broken.id, order_request())
        .await
        .unwrap();
    assert_eq!(result.response.status, 200);
    assert!(result.transform_failed);
    // Raw template, placeholder unrendered.
    assert_eq!(result.response.body["order_id"], "{{request.body.order_id}}");

    let calls = h
        .service
        .calls_for_endpoint(&broken.id, QueryWindow::default())
        .await
        .unwrap();
    assert!(calls[0].transform_failed);
}

#[tokio::test]
async fn dispatching_against_an_unknown_environment_is_an_error() {
    let h = harness().await;
    let missing = doppel_types::EnvironmentId::generate();
    let err = h
        .service
        .dispatch(&missing, order_request())
        .await
        .expect_err("unknown environment must error");
    assert!(err.to_string().contains("environment not found"));

    // Nothing gets logged for a rejected dispatch.
    let calls = h.service.call_log(QueryWindow::default()).await.unwrap();
    assert!(calls.is_empty());
}

#[tokio::test]
async fn executing_an_unknown_endpoint_id_is_an_error() {
    let h = harness().await;
    let missing = doppel_types::EndpointId::generate();
    let err = h
        .service
        .execute_endpoint(&missing, order_request())
        .await
        .expect_err("unknown id must error");
    assert!(err.to_string().contains("endpoint not found"));
}

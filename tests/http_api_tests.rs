#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use std::sync::Arc;

use occupancy_tool::{
    Month, OccupancyLedger, OccupancyRecord, OccupancyStore, PersistenceError,
    WorkingDaysCalendar, http_api,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

struct UnwritableStore;

impl OccupancyStore for UnwritableStore {
    fn save_ledger(&self, _ledger: &OccupancyLedger) -> Result<(), PersistenceError> {
        Err(PersistenceError::InvalidData("disk full".into()))
    }

    fn load_ledger(&self) -> Result<Option<OccupancyLedger>, PersistenceError> {
        Ok(None)
    }
}

fn new_router() -> axum::Router {
    let calendar = WorkingDaysCalendar::empty()
        .with_days(Month::January, 22)
        .with_days(Month::February, 20);
    let ledger = OccupancyLedger::new().with_calendar(calendar);
    http_api::router(http_api::AppState::new(ledger))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn record_lifecycle_via_http_api() {
    let app = new_router();

    let (status, created) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({"employee_id": 1, "project_id": 10, "january": 11, "february": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!(1));
    assert_eq!(created["february"], json!(10));

    let (status, fetched) = send(&app, "GET", "/occupancy/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let record: OccupancyRecord = serde_json::from_value(fetched).unwrap();
    assert_eq!(record.days(Month::January), 11);

    let (status, _) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({"id": 1, "employee_id": 1, "project_id": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", "/occupancy/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/occupancy/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("not_found"));
}

#[tokio::test]
async fn reports_reflect_current_records() {
    let app = new_router();
    for payload in [
        json!({"id": 1, "employee_id": 2, "project_id": 10, "january": 10, "february": 5}),
        json!({"id": 2, "employee_id": 2, "project_id": 20, "january": 5, "february": 5}),
    ] {
        let (status, _) = send(&app, "POST", "/occupancy", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, month) = send(&app, "GET", "/reports/employees/2/months/jan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(month["allocated_days"], json!(15));
    assert_eq!(month["utilization_percent"], json!(68));

    let (status, share) = send(&app, "GET", "/reports/employees/2/projects/10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(share["total_days"], json!(15));
    assert_eq!(share["percentage"], json!(36));

    let (status, report) = send(&app, "GET", "/reports/occupancy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_working_days"], json!(42));
    assert_eq!(report["rows"].as_array().unwrap().len(), 1);
    // 25 / 42
    assert_eq!(report["rows"][0]["aggregate"]["occupancy_rate"], json!(60));

    let (status, _) = send(&app, "GET", "/reports/employees/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/reports/employees/2/months/smarch", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid_request"));
}

#[tokio::test]
async fn invalid_record_payload_returns_bad_request() {
    let app = new_router();
    let (status, body) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({
            "id": 3,
            "employee_id": 1,
            "project_id": 10,
            "start_date": "2025-05-01",
            "end_date": "2025-04-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("after end_date")
    );

    let (status, _) = send(
        &app,
        "PUT",
        "/occupancy/4",
        Some(json!({"id": 5, "employee_id": 1, "project_id": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calendar_and_directory_endpoints() {
    let app = new_router();

    let (status, calendar) = send(
        &app,
        "PUT",
        "/calendar",
        Some(json!({"january": 20, "february": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calendar["january"], json!(20));
    assert_eq!(calendar["march"], json!(0));

    let (status, _) = send(
        &app,
        "POST",
        "/employees",
        Some(json!({"id": 7, "name": "Grace"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, employee) = send(&app, "GET", "/employees/7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(employee["name"], json!("Grace"));

    let (status, report) = send(&app, "GET", "/reports/employees/7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["employee_name"], json!("Grace"));
    assert_eq!(report["aggregate"]["occupancy_rate"], json!(0));

    let (status, _) = send(&app, "POST", "/projects", Some(json!({"id": 0, "name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_store_write_leaves_ledger_unchanged() {
    let mut ledger = OccupancyLedger::new();
    ledger
        .upsert_record(OccupancyRecord::new(1, 1, 10).with_days(Month::January, 4))
        .unwrap();
    let state = http_api::AppState::with_store(ledger, Arc::new(UnwritableStore));
    let app = http_api::router(state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({"id": 2, "employee_id": 1, "project_id": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("internal_error"));
    let (status, _) = send(&app, "GET", "/occupancy/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/occupancy/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = send(
        &app,
        "PUT",
        "/calendar",
        Some(json!({"january": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let ledger = state.ledger();
    let ledger = ledger.read();
    assert_eq!(ledger.records().len(), 1);
    assert_eq!(ledger.find_record(1).unwrap().days(Month::January), 4);
    assert_eq!(ledger.calendar(), &WorkingDaysCalendar::default());
}

#[tokio::test]
async fn exhausted_record_ids_return_conflict() {
    let app = new_router();
    let (status, _) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({"id": i32::MAX, "employee_id": 1, "project_id": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/occupancy",
        Some(json!({"employee_id": 1, "project_id": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("conflict"));
}

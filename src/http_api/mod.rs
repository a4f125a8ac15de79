use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::{
    EmployeeMonthlyUtilization, LedgerMetadata, Month, OccupancyLedger, OccupancyRecord,
    OccupancyReport, OccupancyStore, ProjectAllocation, WorkingDaysCalendar,
    ledger::LedgerError,
    persistence::PersistenceError,
    record::{Employee, Project},
    report::EmployeeOccupancyRow,
};

type SharedStore = Arc<dyn OccupancyStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    ledger: Arc<RwLock<OccupancyLedger>>,
    store: Option<SharedStore>,
}

impl AppState {
    pub fn new(ledger: OccupancyLedger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store: None,
        }
    }

    /// Every write is saved to `store` before it becomes visible.
    pub fn with_store(ledger: OccupancyLedger, store: SharedStore) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store: Some(store),
        }
    }

    pub fn ledger(&self) -> Arc<RwLock<OccupancyLedger>> {
        self.ledger.clone()
    }

    /// Apply `change` under the write lock. With a store configured the change
    /// runs on a copy, and the live ledger is replaced only after the copy saved.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut OccupancyLedger) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut guard = self.ledger.write();
        let Some(store) = &self.store else {
            return change(&mut *guard);
        };
        let mut next = guard.clone();
        let out = change(&mut next)?;
        store.save_ledger(&next)?;
        *guard = next;
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::RecordNotFound(_) => ApiError::NotFound(value.to_string()),
            LedgerError::IdSpaceExhausted(_) => ApiError::Conflict(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        tracing::error!(error = %value, "ledger persistence failed");
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/calendar", get(get_calendar).put(update_calendar))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/:id", get(get_employee))
        .route("/projects", get(list_projects).post(create_project))
        .route("/occupancy", get(list_records).post(create_record))
        .route(
            "/occupancy/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/reports/occupancy", get(occupancy_report))
        .route("/reports/employees/:id", get(employee_report))
        .route(
            "/reports/employees/:id/months/:month",
            get(employee_month_utilization),
        )
        .route(
            "/reports/employees/:id/projects/:project_id",
            get(employee_project_share),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "occupancy HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<LedgerMetadata> {
    Json(state.ledger.read().metadata().clone())
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<LedgerMetadata>,
) -> Result<Json<LedgerMetadata>, ApiError> {
    state
        .update(|ledger| {
            ledger.set_metadata(metadata)?;
            Ok(ledger.metadata().clone())
        })
        .map(Json)
}

async fn get_calendar(State(state): State<AppState>) -> Json<WorkingDaysCalendar> {
    Json(*state.ledger.read().calendar())
}

async fn update_calendar(
    State(state): State<AppState>,
    Json(calendar): Json<WorkingDaysCalendar>,
) -> Result<Json<WorkingDaysCalendar>, ApiError> {
    state
        .update(|ledger| {
            ledger.set_calendar(calendar);
            Ok(*ledger.calendar())
        })
        .map(Json)
}

async fn list_employees(State(state): State<AppState>) -> Json<Vec<Employee>> {
    Json(state.ledger.read().employees().to_vec())
}

async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i32>,
) -> Result<Json<Employee>, ApiError> {
    state
        .ledger
        .read()
        .employee(employee_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("employee {employee_id} not found")))
}

async fn create_employee(
    State(state): State<AppState>,
    Json(employee): Json<Employee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    state.update(|ledger| Ok(ledger.upsert_employee(employee.clone())?))?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
    Json(state.ledger.read().projects().to_vec())
}

async fn create_project(
    State(state): State<AppState>,
    Json(project): Json<Project>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    state.update(|ledger| Ok(ledger.upsert_project(project.clone())?))?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_records(State(state): State<AppState>) -> Json<Vec<OccupancyRecord>> {
    Json(state.ledger.read().records().to_vec())
}

async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<i32>,
) -> Result<Json<OccupancyRecord>, ApiError> {
    state
        .ledger
        .read()
        .find_record(record_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("occupancy record {record_id} not found")))
}

/// A payload without an id (or id 0) is assigned the next free id.
async fn create_record(
    State(state): State<AppState>,
    Json(mut record): Json<OccupancyRecord>,
) -> Result<(StatusCode, Json<OccupancyRecord>), ApiError> {
    let record = state.update(|ledger| {
        if record.id == 0 {
            record.id = ledger.next_record_id()?;
        } else if ledger.find_record(record.id).is_some() {
            return Err(ApiError::Conflict(format!(
                "occupancy record {} already exists",
                record.id
            )));
        }
        ledger.upsert_record(record.clone())?;
        Ok(record)
    })?;
    tracing::info!(record_id = record.id, "occupancy record created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<i32>,
    Json(record): Json<OccupancyRecord>,
) -> Result<Json<OccupancyRecord>, ApiError> {
    if record.id != record_id {
        return Err(ApiError::invalid(
            "record id in payload does not match path parameter",
        ));
    }
    state.update(|ledger| {
        if ledger.find_record(record_id).is_none() {
            return Err(ApiError::not_found(format!(
                "occupancy record {record_id} not found"
            )));
        }
        ledger.upsert_record(record.clone())?;
        Ok(())
    })?;
    Ok(Json(record))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(record_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.update(|ledger| {
        if !ledger.delete_record(record_id) {
            return Err(ApiError::not_found(format!(
                "occupancy record {record_id} not found"
            )));
        }
        Ok(())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn occupancy_report(State(state): State<AppState>) -> Json<OccupancyReport> {
    Json(state.ledger.read().report())
}

async fn employee_report(
    State(state): State<AppState>,
    Path(employee_id): Path<i32>,
) -> Result<Json<EmployeeOccupancyRow>, ApiError> {
    state
        .ledger
        .read()
        .report()
        .rows
        .into_iter()
        .find(|row| row.employee_id == employee_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("employee {employee_id} not found")))
}

async fn employee_month_utilization(
    State(state): State<AppState>,
    Path((employee_id, month)): Path<(i32, String)>,
) -> Result<Json<EmployeeMonthlyUtilization>, ApiError> {
    let month: Month = month
        .parse()
        .map_err(|err: crate::month::UnknownMonth| ApiError::invalid(err.to_string()))?;
    let guard = state.ledger.read();
    Ok(Json(
        guard
            .aggregator()
            .employee_monthly_utilization(employee_id, month),
    ))
}

async fn employee_project_share(
    State(state): State<AppState>,
    Path((employee_id, project_id)): Path<(i32, i32)>,
) -> Json<ProjectAllocation> {
    let guard = state.ledger.read();
    Json(guard.aggregator().project_share(employee_id, project_id))
}

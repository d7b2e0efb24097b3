use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ClinicVisit, HealthRecordId, HealthRecordKind};
use super::repository::HealthRecordRepository;
use super::service::{HealthRecordError, HealthRecordService};
use crate::identity::Caller;
use crate::residents::{ResidentId, ResidentRepository};

const DEFAULT_UPCOMING_DAYS: u32 = 14;

#[derive(Debug, Deserialize)]
pub struct OpenRecordRequest {
    #[serde(default)]
    pub resident_id: Option<ResidentId>,
    pub kind: HealthRecordKind,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub resident_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub within_days: Option<u32>,
}

pub fn health_router<H, R>(service: Arc<HealthRecordService<H, R>>) -> Router
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/health/records",
            post(open_handler::<H, R>).get(records_handler::<H, R>),
        )
        .route("/api/v1/health/records/:record_id", get(record_handler::<H, R>))
        .route(
            "/api/v1/health/records/:record_id/visits",
            post(visit_handler::<H, R>),
        )
        .route("/api/v1/health/upcoming", get(upcoming_handler::<H, R>))
        .with_state(service)
}

pub(crate) async fn open_handler<H, R>(
    State(service): State<Arc<HealthRecordService<H, R>>>,
    caller: Caller,
    axum::Json(request): axum::Json<OpenRecordRequest>,
) -> Response
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    let resident_id = request
        .resident_id
        .unwrap_or_else(|| caller.resident_id.clone());
    if let Err(rejection) = caller.require_access_to(&resident_id) {
        return rejection.into_response();
    }

    match service.open_record(&resident_id, request.kind) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => health_error_response(err),
    }
}

pub(crate) async fn records_handler<H, R>(
    State(service): State<Arc<HealthRecordService<H, R>>>,
    caller: Caller,
    Query(query): Query<RecordsQuery>,
) -> Response
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    let resident_id = query
        .resident_id
        .map(ResidentId)
        .unwrap_or_else(|| caller.resident_id.clone());
    if let Err(rejection) = caller.require_access_to(&resident_id) {
        return rejection.into_response();
    }

    match service.for_resident(&resident_id) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => health_error_response(err),
    }
}

pub(crate) async fn record_handler<H, R>(
    State(service): State<Arc<HealthRecordService<H, R>>>,
    caller: Caller,
    Path(record_id): Path<String>,
) -> Response
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    match service.get(&HealthRecordId(record_id)) {
        Ok(record) => match caller.require_access_to(&record.resident_id) {
            Ok(()) => (StatusCode::OK, axum::Json(record)).into_response(),
            Err(rejection) => rejection.into_response(),
        },
        Err(err) => health_error_response(err),
    }
}

pub(crate) async fn visit_handler<H, R>(
    State(service): State<Arc<HealthRecordService<H, R>>>,
    caller: Caller,
    Path(record_id): Path<String>,
    axum::Json(visit): axum::Json<ClinicVisit>,
) -> Response
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    let today = service.today();
    match service.record_visit(&HealthRecordId(record_id), visit, today) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => health_error_response(err),
    }
}

pub(crate) async fn upcoming_handler<H, R>(
    State(service): State<Arc<HealthRecordService<H, R>>>,
    caller: Caller,
    Query(query): Query<UpcomingQuery>,
) -> Response
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    let within_days = query.within_days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    match service.upcoming_visits(service.today(), within_days) {
        Ok(visits) => (StatusCode::OK, axum::Json(visits)).into_response(),
        Err(err) => health_error_response(err),
    }
}

fn health_error_response(err: HealthRecordError) -> Response {
    let status = match &err {
        HealthRecordError::ResidentNotFound(_) | HealthRecordError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        HealthRecordError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        HealthRecordError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ProfileUpdate, ResidentId, ResidentRegistration, ResidentSummary};
use super::import::ResidentImportError;
use super::repository::ResidentRepository;
use super::service::{DirectoryError, ResidentDirectoryService};
use crate::identity::Caller;
use crate::notifications::NotificationDispatcher;

/// Router builder exposing resident registration and profile endpoints.
pub fn resident_router<R, N>(service: Arc<ResidentDirectoryService<R, N>>) -> Router
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/residents",
            post(register_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/residents/import", post(import_handler::<R, N>))
        .route(
            "/api/v1/residents/:resident_id",
            get(profile_handler::<R, N>)
                .patch(update_handler::<R, N>)
                .delete(remove_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
    axum::Json(registration): axum::Json<ResidentRegistration>,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.register(registration) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => directory_error_response(err),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.list() {
        Ok(records) => {
            let summaries: Vec<ResidentSummary> =
                records.iter().map(|record| record.summary()).collect();
            (StatusCode::OK, axum::Json(summaries)).into_response()
        }
        Err(err) => directory_error_response(err),
    }
}

pub(crate) async fn profile_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
    Path(resident_id): Path<String>,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let id = ResidentId(resident_id);
    if let Err(rejection) = caller.require_access_to(&id) {
        return rejection.into_response();
    }

    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => directory_error_response(err),
    }
}

pub(crate) async fn update_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
    Path(resident_id): Path<String>,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let id = ResidentId(resident_id);
    if let Err(rejection) = caller.require_access_to(&id) {
        return rejection.into_response();
    }
    if update.conduct.is_some() && !caller.is_officer() {
        let payload = json!({ "error": "only officers may record conduct assessments" });
        return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
    }

    match service.update_profile(&id, update) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => directory_error_response(err),
    }
}

pub(crate) async fn remove_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
    Path(resident_id): Path<String>,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.remove(&ResidentId(resident_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => directory_error_response(err),
    }
}

pub(crate) async fn import_handler<R, N>(
    State(service): State<Arc<ResidentDirectoryService<R, N>>>,
    caller: Caller,
    body: String,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.import(Cursor::new(body.into_bytes())) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err @ ResidentImportError::Csv(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn directory_error_response(err: DirectoryError) -> Response {
    let status = match &err {
        DirectoryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::DuplicateNic(_) => StatusCode::CONFLICT,
        DirectoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

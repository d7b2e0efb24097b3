use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationId, WelfareDecision, WelfareSubmission};
use super::repository::WelfareRepository;
use super::service::{WelfareError, WelfareService};
use crate::identity::Caller;
use crate::notifications::NotificationDispatcher;
use crate::residents::ResidentRepository;

/// Router builder exposing welfare application intake and review endpoints.
pub fn welfare_router<W, R, N>(service: Arc<WelfareService<W, R, N>>) -> Router
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/welfare/applications",
            post(submit_handler::<W, R, N>).get(own_applications_handler::<W, R, N>),
        )
        .route("/api/v1/welfare/queue", get(queue_handler::<W, R, N>))
        .route(
            "/api/v1/welfare/applications/:application_id/decision",
            post(decision_handler::<W, R, N>),
        )
        .route(
            "/api/v1/welfare/applications/:application_id/withdraw",
            post(withdraw_handler::<W, R, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<W, R, N>(
    State(service): State<Arc<WelfareService<W, R, N>>>,
    caller: Caller,
    axum::Json(submission): axum::Json<WelfareSubmission>,
) -> Response
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.submit(&caller.resident_id, submission) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(err) => welfare_error_response(err),
    }
}

pub(crate) async fn own_applications_handler<W, R, N>(
    State(service): State<Arc<WelfareService<W, R, N>>>,
    caller: Caller,
) -> Response
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.for_resident(&caller.resident_id) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => welfare_error_response(err),
    }
}

pub(crate) async fn queue_handler<W, R, N>(
    State(service): State<Arc<WelfareService<W, R, N>>>,
    caller: Caller,
) -> Response
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.open() {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => welfare_error_response(err),
    }
}

pub(crate) async fn decision_handler<W, R, N>(
    State(service): State<Arc<WelfareService<W, R, N>>>,
    caller: Caller,
    Path(application_id): Path<String>,
    axum::Json(decision): axum::Json<WelfareDecision>,
) -> Response
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.decide(&ApplicationId(application_id), decision) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => welfare_error_response(err),
    }
}

pub(crate) async fn withdraw_handler<W, R, N>(
    State(service): State<Arc<WelfareService<W, R, N>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Response
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.withdraw(&ApplicationId(application_id), &caller.resident_id) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => welfare_error_response(err),
    }
}

fn welfare_error_response(err: WelfareError) -> Response {
    let status = match &err {
        WelfareError::ResidentNotFound(_) | WelfareError::NotFound(_) => StatusCode::NOT_FOUND,
        WelfareError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WelfareError::DuplicateOpenApplication(_) | WelfareError::AlreadyClosed(_) => {
            StatusCode::CONFLICT
        }
        WelfareError::NotOwner => StatusCode::FORBIDDEN,
        WelfareError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::service::{
    CertificateDecision, CertificateError, CertificateStatusView, CertificateWorkflowService,
};
use crate::identity::Caller;
use crate::notifications::NotificationDispatcher;
use crate::residents::{ResidentId, ResidentRepository};

/// Router builder exposing the certificate request, decision, and document endpoints.
pub fn certificate_router<R, N>(service: Arc<CertificateWorkflowService<R, N>>) -> Router
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/certificate/request",
            post(request_handler::<R, N>),
        )
        .route(
            "/api/v1/certificate/decision",
            post(decision_handler::<R, N>),
        )
        .route("/api/v1/certificate/cancel", post(cancel_handler::<R, N>))
        .route("/api/v1/certificate/status", get(status_handler::<R, N>))
        .route("/api/v1/certificate/queue", get(queue_handler::<R, N>))
        .route(
            "/api/v1/certificate/document/:resident_id",
            get(document_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn request_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.request(&caller.resident_id) {
        Ok(status) => transition_response("certificate request submitted", status),
        Err(err) => certificate_error_response(err),
    }
}

pub(crate) async fn decision_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
    caller: Caller,
    axum::Json(decision): axum::Json<CertificateDecision>,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    let message = if decision.approved {
        "certificate approved"
    } else {
        "certificate rejected"
    };
    match service.decide(decision) {
        Ok(status) => transition_response(message, status),
        Err(err) => certificate_error_response(err),
    }
}

pub(crate) async fn cancel_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.cancel(&caller.resident_id) {
        Ok(status) => transition_response("certificate request cancelled", status),
        Err(err) => certificate_error_response(err),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.status(&caller.resident_id) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(err) => certificate_error_response(err),
    }
}

pub(crate) async fn queue_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
    caller: Caller,
) -> Response
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    if let Err(rejection) = caller.require_officer() {
        return rejection.into_response();
    }

    match service.queue() {
        Ok(queue) => (StatusCode::OK, axum::Json(queue)).into_response(),
        Err(err) => certificate_error_response(err),
    }
}

pub(crate) async fn document_handler<R, N>(
    State(service): State<Arc<CertificateWorkflowService<R, N>>>,
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

    match service.document(&id) {
        Ok(document) => {
            let disposition = format!("attachment; filename=\"{}\"", document.file_name);
            let headers = [
                (header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ];
            (StatusCode::OK, headers, document.body).into_response()
        }
        Err(err) => certificate_error_response(err),
    }
}

fn transition_response(message: &str, status: CertificateStatusView) -> Response {
    let payload = json!({ "message": message, "status": status });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn certificate_error_response(err: CertificateError) -> Response {
    let status = match &err {
        CertificateError::NotFound(_) => StatusCode::NOT_FOUND,
        CertificateError::AlreadySubmitted | CertificateError::NothingToCancel => {
            StatusCode::BAD_REQUEST
        }
        CertificateError::CooldownActive { days_left } => {
            let payload = json!({ "error": err.to_string(), "days_left": days_left });
            return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
        }
        CertificateError::NoActiveRequest => StatusCode::CONFLICT,
        CertificateError::NotApproved => StatusCode::FORBIDDEN,
        CertificateError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CertificateError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

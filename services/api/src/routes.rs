use crate::infra::{AppState, PortalServices};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use village_portal::chat::chat_router;
use village_portal::health_records::health_router;
use village_portal::notifications::NotificationDispatcher;
use village_portal::residents::resident_router;
use village_portal::workflows::certificate::certificate_router;
use village_portal::workflows::welfare::welfare_router;

pub(crate) fn with_portal_routes<N>(services: &PortalServices<N>) -> axum::Router
where
    N: NotificationDispatcher + 'static,
{
    resident_router(services.directory.clone())
        .merge(certificate_router(services.certificates.clone()))
        .merge(welfare_router(services.welfare.clone()))
        .merge(health_router(services.health.clone()))
        .merge(chat_router(services.chat.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

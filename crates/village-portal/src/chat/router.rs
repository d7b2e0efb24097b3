use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::bot::BotResponder;
use super::presence::PresenceRegistry;
use super::relay::{ChatError, ChatRelay};
use crate::identity::Caller;
use crate::residents::ResidentId;

#[derive(Debug, Deserialize)]
pub struct PostMessage {
    #[serde(default)]
    pub recipient: Option<ResidentId>,
    pub body: String,
}

pub fn chat_router<P, B>(relay: Arc<ChatRelay<P, B>>) -> Router
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    Router::new()
        .route(
            "/api/v1/chat/presence",
            post(connect_handler::<P, B>).delete(disconnect_handler::<P, B>),
        )
        .route("/api/v1/chat/online", get(online_handler::<P, B>))
        .route(
            "/api/v1/chat/rooms/:room/messages",
            post(post_handler::<P, B>).get(history_handler::<P, B>),
        )
        .with_state(relay)
}

pub(crate) async fn connect_handler<P, B>(
    State(relay): State<Arc<ChatRelay<P, B>>>,
    caller: Caller,
) -> Response
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    relay.presence().connect(&caller.resident_id);
    let payload = json!({ "resident_id": caller.resident_id, "online": true });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn disconnect_handler<P, B>(
    State(relay): State<Arc<ChatRelay<P, B>>>,
    caller: Caller,
) -> Response
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    relay.presence().disconnect(&caller.resident_id);
    let online = relay.presence().is_online(&caller.resident_id);
    let payload = json!({ "resident_id": caller.resident_id, "online": online });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn online_handler<P, B>(
    State(relay): State<Arc<ChatRelay<P, B>>>,
    _caller: Caller,
) -> Response
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    (StatusCode::OK, axum::Json(relay.presence().online())).into_response()
}

pub(crate) async fn post_handler<P, B>(
    State(relay): State<Arc<ChatRelay<P, B>>>,
    caller: Caller,
    Path(room): Path<String>,
    axum::Json(message): axum::Json<PostMessage>,
) -> Response
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    match relay.post(&room, &caller.resident_id, message.recipient, &message.body) {
        Ok(delivered) => (StatusCode::CREATED, axum::Json(delivered)).into_response(),
        Err(err) => chat_error_response(err),
    }
}

pub(crate) async fn history_handler<P, B>(
    State(relay): State<Arc<ChatRelay<P, B>>>,
    _caller: Caller,
    Path(room): Path<String>,
) -> Response
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    match relay.history(&room) {
        Ok(messages) => (StatusCode::OK, axum::Json(messages)).into_response(),
        Err(err) => chat_error_response(err),
    }
}

fn chat_error_response(err: ChatError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

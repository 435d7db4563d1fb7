use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::parse_date;
use crate::error::AppResult;
use crate::services::sessions::SelectionEvent;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/toggle", patch(toggle_seat))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/checkout", post(checkout))
        .route("/sessions/{id}/ws", get(selection_updates))
}

/* ---------- SESSIONS ---------- */

// POST /api/sessions
#[derive(Debug, Deserialize, Validate)]
struct OpenSessionRequest {
    #[validate(length(min = 1, max = 64))]
    layout_key: String,
    date: Option<String>,
    #[validate(range(min = 1, max = 50))]
    max_seats: Option<usize>,
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let date = parse_date(req.date.as_deref())?;

    let session = state.sessions.open(&req.layout_key, date, req.max_seats).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "session": session })),
    ))
}

// GET /api/sessions/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let session = state.sessions.snapshot(id).await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

// DELETE /api/sessions/{id}
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- SEATS ---------- */

// PATCH /api/sessions/{id}/toggle
#[derive(Debug, Deserialize, Validate)]
struct ToggleRequest {
    #[validate(length(min = 1, max = 64))]
    seat_id: String,
}

async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Json<serde_json::Value>> {
    req.validate()?;
    let result = state.sessions.toggle(id, &req.seat_id).await?;

    // Locked и SelectionFull - штатные исходы, клиент решает сам что показать
    Ok(Json(json!({
        "success": true,
        "outcome": result.outcome,
        "changed": result.outcome.changed(),
        "session": result.session,
    })))
}

// POST /api/sessions/{id}/reset
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let session = state.sessions.reset(id).await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

// POST /api/sessions/{id}/checkout
async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let booking = state.sessions.checkout(id).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

/* ---------- WEBSOCKET ---------- */

// GET /api/sessions/{id}/ws
async fn selection_updates(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    // подписываемся до апгрейда, чтобы отдать 404 обычным ответом
    let rx = state.sessions.subscribe(id).await?;
    debug!("WebSocket subscription requested for session {}", id);
    Ok(ws.on_upgrade(move |socket| stream_selection(socket, id, rx)))
}

async fn stream_selection(socket: WebSocket, id: Uuid, mut rx: broadcast::Receiver<SelectionEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Failed to encode selection event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // клиент получит следующее событие с полным составом выбора
                    debug!("WebSocket for session {} lagged by {} events", id, skipped);
                }
                // сессия закрыта или истекла
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    debug!("WebSocket for session {} closed", id);
}

//! Message request endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use pulse_core::{MessageStatus, NewMessage, PulseError};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::ErrorResponse;
use crate::AppState;

/// Body of a status update
#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

/// Create message routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/message", get(list_messages).post(create_message))
        .route("/message/{id}", patch(update_status))
}

/// List every message, oldest first
async fn list_messages(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list() {
        Ok(messages) => {
            info!("Returning {} messages", messages.len());
            (StatusCode::OK, Json(messages)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// Store a new message request
///
/// The body is read as JSON whatever the `Content-Type` header says.
async fn create_message(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let new: NewMessage = match serde_json::from_slice(&body) {
        Ok(new) => new,
        Err(e) => {
            warn!("Rejected message body: {}", e);
            return error_response(PulseError::parse(format!("Invalid message body: {}", e)));
        }
    };

    match state.store.create(&new) {
        Ok(message) => {
            info!("Created message {:?}", message.id);
            (StatusCode::CREATED, Json(message)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// Record the delivery outcome of a message
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> impl IntoResponse {
    let update: StatusUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => return error_response(PulseError::parse(format!("Invalid status body: {}", e))),
    };
    let status: MessageStatus = match update.status.parse() {
        Ok(status) => status,
        Err(e) => return error_response(PulseError::validation(e)),
    };

    match state.store.set_status(id, status) {
        Ok(message) => (StatusCode::OK, Json(message)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

fn error_response(e: PulseError) -> axum::response::Response {
    let code = match &e {
        PulseError::Parse(_) | PulseError::Validation(_) => StatusCode::BAD_REQUEST,
        PulseError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("Message store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        code,
        Json(ErrorResponse {
            error: e.user_message().to_string(),
        }),
    )
        .into_response()
}

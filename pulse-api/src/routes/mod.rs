//! API route definitions

mod health;
mod messages;

use axum::Router;
use serde::Serialize;

use crate::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(messages::routes())
        .merge(health::routes())
}

//! Pulse message API
//!
//! Serves the message request list the board reads and writes.

pub mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use pulse_services::MessageStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MessageStore>,
}

impl AppState {
    pub fn new(store: MessageStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build the router with every API route under `/api`
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

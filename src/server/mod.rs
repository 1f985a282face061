//! HTTP server for the webhook event recorder.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub, classifies them and stores push and pull request events
//! - Serves stored events back as JSON
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook/github` - Accepts GitHub webhook deliveries
//! - `GET /webhook/health` - Returns 200 if the server is running
//! - `GET /webhook/events` - Lists stored events (`type`, `limit` query parameters)
//! - `GET /webhook/events/latest` - Returns the newest stored event
//! - `GET /` - Describes the endpoints above

use std::sync::Arc;

use axum::Json;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::persistence::EventStore;

pub mod events;
pub mod health;
pub mod webhook;

pub use events::{events_handler, latest_handler};
pub use health::health_handler;
pub use webhook::webhook_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. The store is
/// opened once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn EventStore>,
}

impl AppState {
    /// Creates a new `AppState` around an already-connected store.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        AppState { store }
    }

    /// Returns the event store.
    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }
}

/// Describes the service and its endpoints.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "message": "GitHub Webhook Server",
        "endpoints": {
            "webhook": "/webhook/github (POST)",
            "health": "/webhook/health (GET)",
            "events": "/webhook/events (GET)",
            "latest": "/webhook/events/latest (GET)"
        }
    }))
}

/// Builds the axum Router with all endpoints.
///
/// CORS is fully permissive so a browser dashboard on another origin can
/// poll the read endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(index_handler))
        .route("/webhook/github", post(webhook_handler))
        .route("/webhook/health", get(health_handler))
        .route("/webhook/events", get(events_handler))
        .route("/webhook/events/latest", get(latest_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

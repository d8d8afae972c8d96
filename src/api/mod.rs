//! HTTP listing endpoint
//!
//! One read-only route for station discovery plus a health check. No
//! authentication; mutating operations only exist on the chat surface.

use crate::station::{StationRegistry, StationSummary};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(registry: Arc<StationRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(list_stations))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_stations(
    State(registry): State<Arc<StationRegistry>>,
) -> Json<Vec<StationSummary>> {
    Json(registry.list_stations().await)
}

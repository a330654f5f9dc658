// src/routes/health.rs
//! Liveness endpoint for the tankflow backend.
//!
//! Used by container orchestrators and CI to verify the service responds to
//! HTTP requests. Deliberately touches no collaborator: no database, no
//! notifier.

use axum::{routing::get, Json, Router};
use serde::Serialize;

// ---

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "codemetal-tankflow",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

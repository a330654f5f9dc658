//! Route gateway for the tankflow API (EMBP).
//!
//! Each endpoint family lives in a sibling module that exports a subrouter;
//! this gateway merges them and attaches the shared application state so
//! `main.rs` never learns about individual endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};

use crate::config::Config;
use crate::error::EngineError;
use crate::notify::AlertNotifier;
use crate::store::PgStore;

mod aggregates;
mod health;
mod readings;
mod tanks;

// ---

/// Shared state for all routes.
pub type AppState = (PgStore, AlertNotifier, Config);

pub fn router(store: PgStore, notifier: AlertNotifier, config: Config) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(aggregates::router())
        .merge(tanks::router())
        .merge(health::router())
        .with_state((store, notifier, config))
}

// ---

/// Map an engine error onto the API surface.
///
/// Validation problems are the caller's fault; configuration problems are
/// the tank's data quality; store problems are ours. Notification errors
/// never reach here — dispatch recovers them locally.
pub(crate) fn engine_error_response(error: &EngineError) -> Response {
    // ---
    let status = match error {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Notification(_) | EngineError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

/// 404 for an unknown tank id.
pub(crate) fn unknown_tank_response(tank_id: &str) -> Response {
    // ---
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("unknown tank '{}'", tank_id) })),
    )
        .into_response()
}

//! Tank registration endpoints.
//!
//! Thin glue over the registry table: sellers register tanks here, the
//! scheduler and the engine read them. No engine logic lives in this file.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use serde::Deserialize;

use crate::models::Tank;
use crate::store::ReadingStore;

use super::{engine_error_response, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/tanks", post(register_tank).get(list_tanks))
}

/// Registration request body.
#[derive(Debug, Deserialize)]
struct RegisterTank {
    tank_id: String,
    capacity_liters: f32,
    contact_email: Option<String>,
}

async fn register_tank(
    State((store, _notifier, _config)): State<AppState>,
    Json(request): Json<RegisterTank>,
) -> Response {
    // ---
    if request.tank_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "tank_id must not be empty" })),
        )
            .into_response();
    }
    if !request.capacity_liters.is_finite() || request.capacity_liters <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!(
                    "capacity_liters must be a positive number, got {}",
                    request.capacity_liters
                )
            })),
        )
            .into_response();
    }

    let tank = Tank {
        tank_id: request.tank_id,
        capacity_liters: request.capacity_liters,
        contact_email: request.contact_email,
    };

    match store.insert_tank(&tank).await {
        Ok(()) => (StatusCode::CREATED, Json(tank)).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

async fn list_tanks(State((store, _notifier, _config)): State<AppState>) -> Response {
    // ---
    match store.query_tanks().await {
        Ok(tanks) => (StatusCode::OK, Json(tanks)).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

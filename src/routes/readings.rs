//! Reading ingestion and retrieval endpoints.
//!
//! The two ingestion handlers are deliberately thin: validate the raw body,
//! resolve the tank, and hand off to the shared engine pipeline. Threshold
//! and notification semantics live in `engine`, not here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::engine;
use crate::models::{RawLevelReading, RawQualityReading, Reading, ReadingKind};
use crate::store::ReadingStore;

use super::{engine_error_response, unknown_tank_response, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/readings/level", post(ingest_level))
        .route("/readings/quality", post(ingest_quality))
        .route("/tanks/{tank_id}/readings", get(list_readings))
}

async fn ingest_level(
    State(state): State<AppState>,
    Json(raw): Json<RawLevelReading>,
) -> Response {
    // ---
    info!("POST /readings/level - tank {}", raw.tank_id);
    let reading = match raw.validate(Utc::now()) {
        Ok(reading) => reading,
        Err(e) => return engine_error_response(&e),
    };
    ingest(&state, reading).await
}

async fn ingest_quality(
    State(state): State<AppState>,
    Json(raw): Json<RawQualityReading>,
) -> Response {
    // ---
    info!("POST /readings/quality - tank {}", raw.tank_id);
    let reading = match raw.validate(Utc::now()) {
        Ok(reading) => reading,
        Err(e) => return engine_error_response(&e),
    };
    ingest(&state, reading).await
}

/// Shared tail of both ingestion handlers: resolve the tank, run the
/// pipeline, report. The response code reflects the store write only;
/// alerting outcome rides along in the body for observability.
async fn ingest(state: &AppState, reading: Reading) -> Response {
    // ---
    let (store, notifier, config) = state;

    let tank = match store.find_tank(&reading.tank_id).await {
        Ok(Some(tank)) => tank,
        Ok(None) => return unknown_tank_response(&reading.tank_id),
        Err(e) => return engine_error_response(&e),
    };

    match engine::ingest_reading(store, notifier, &tank, reading, &config.ops_alert_email).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

// ---

/// Query parameters for reading retrieval.
#[derive(Debug, Deserialize)]
struct ReadingsQuery {
    kind: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: Option<u32>,
}

async fn list_readings(
    Path(tank_id): Path<String>,
    Query(params): Query<ReadingsQuery>,
    State((store, _notifier, _config)): State<AppState>,
) -> Response {
    // ---
    let kind = match params.kind.as_deref() {
        None => ReadingKind::Level,
        Some(s) => match ReadingKind::parse(s) {
            Ok(kind) => kind,
            Err(e) => return engine_error_response(&e),
        },
    };

    let range = match (params.from, params.to) {
        (Some(from), Some(to)) => Some((from, to)),
        (None, None) => None,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "from and to must be provided together"
                })),
            )
                .into_response();
        }
    };

    match store.query_readings(&tank_id, kind, range).await {
        Ok(readings) => {
            let limit = params.limit.unwrap_or(1000) as usize;
            let readings: Vec<Reading> = readings.into_iter().take(limit).collect();
            (StatusCode::OK, Json(readings)).into_response()
        }
        Err(e) => engine_error_response(&e),
    }
}

//! On-demand aggregation and billing endpoints.
//!
//! These are the consumers of the shared engine: fetch readings, fold them
//! into daily aggregates, and (for billing) sum the period charge. Every
//! dashboard number comes out of these two calls — there is no second
//! implementation of the math anywhere in the product.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::info;

use crate::engine;
use crate::error::EngineError;
use crate::models::ReadingKind;
use crate::store::ReadingStore;

use super::{engine_error_response, unknown_tank_response, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/tanks/{tank_id}/aggregates", get(get_aggregates))
        .route("/tanks/{tank_id}/billing", get(get_billing))
}

/// Convert a local calendar date (under the aggregation offset) to the UTC
/// instant where that day begins.
fn day_start_utc(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<Utc>, EngineError> {
    // ---
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            EngineError::validation(format!("date {} is not representable at this offset", date))
        })
}

// ---

/// Query parameters for `GET /tanks/{tank_id}/aggregates`.
#[derive(Debug, Deserialize)]
struct AggregatesQuery {
    kind: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn get_aggregates(
    Path(tank_id): Path<String>,
    Query(params): Query<AggregatesQuery>,
    State((store, _notifier, config)): State<AppState>,
) -> Response {
    // ---
    info!("GET /tanks/{}/aggregates", tank_id);

    let kind = match params.kind.as_deref() {
        None => ReadingKind::Level,
        Some(s) => match ReadingKind::parse(s) {
            Ok(kind) => kind,
            Err(e) => return engine_error_response(&e),
        },
    };

    let tank = match store.find_tank(&tank_id).await {
        Ok(Some(tank)) => tank,
        Ok(None) => return unknown_tank_response(&tank_id),
        Err(e) => return engine_error_response(&e),
    };

    let offset = config.agg_offset();
    let range = match (params.from, params.to) {
        (Some(from), Some(to)) => {
            let from = match day_start_utc(from, offset) {
                Ok(dt) => dt,
                Err(e) => return engine_error_response(&e),
            };
            let to = match day_start_utc(to, offset) {
                Ok(dt) => dt,
                Err(e) => return engine_error_response(&e),
            };
            Some((from, to))
        }
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

    let readings = match store.query_readings(&tank_id, kind, range).await {
        Ok(readings) => readings,
        Err(e) => return engine_error_response(&e),
    };

    match engine::aggregate(&tank_id, kind, &readings, tank.capacity_liters, offset) {
        Ok(days) => (StatusCode::OK, Json(days)).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

// ---

/// Query parameters for `GET /tanks/{tank_id}/billing`.
///
/// Defaults to the current calendar month (under the aggregation offset);
/// "last month" is the same endpoint with explicit bounds.
#[derive(Debug, Deserialize)]
struct BillingQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

async fn get_billing(
    Path(tank_id): Path<String>,
    Query(params): Query<BillingQuery>,
    State((store, _notifier, config)): State<AppState>,
) -> Response {
    // ---
    info!("GET /tanks/{}/billing", tank_id);

    let tank = match store.find_tank(&tank_id).await {
        Ok(Some(tank)) => tank,
        Ok(None) => return unknown_tank_response(&tank_id),
        Err(e) => return engine_error_response(&e),
    };

    let offset = config.agg_offset();
    let (period_start, period_end) = match (params.start, params.end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) => {
            let today = Utc::now().with_timezone(&offset).date_naive();
            engine::month_bounds(today)
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "start and end must be provided together"
                })),
            )
                .into_response();
        }
    };

    let from = match day_start_utc(period_start, offset) {
        Ok(dt) => dt,
        Err(e) => return engine_error_response(&e),
    };
    let to = match day_start_utc(period_end, offset) {
        Ok(dt) => dt,
        Err(e) => return engine_error_response(&e),
    };

    let readings = match store
        .query_readings(&tank_id, ReadingKind::Level, Some((from, to)))
        .await
    {
        Ok(readings) => readings,
        Err(e) => return engine_error_response(&e),
    };

    let days = match engine::aggregate(
        &tank_id,
        ReadingKind::Level,
        &readings,
        tank.capacity_liters,
        offset,
    ) {
        Ok(days) => days,
        Err(e) => return engine_error_response(&e),
    };

    match engine::bill(
        &tank_id,
        tank.capacity_liters,
        &days,
        period_start,
        period_end,
        config.rate_per_unit,
    ) {
        Ok(bill) => (StatusCode::OK, Json(bill)).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

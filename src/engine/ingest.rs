//! The shared ingestion pipeline: store the reading, evaluate thresholds,
//! dispatch alerts.
//!
//! Every producer of readings — the HTTP ingestion handlers and the
//! scheduler's simulator — runs through this one function, so threshold and
//! notification semantics cannot drift between call sites.

use serde::Serialize;

use crate::engine::dispatch::{dispatch, DispatchResult};
use crate::engine::evaluate::{evaluate, AlertDecision};
use crate::error::EngineError;
use crate::models::{Reading, Tank};
use crate::notify::Notifier;
use crate::store::ReadingStore;

// ---

/// What happened to one ingested reading.
///
/// `stored` is the definitive outcome for the caller; the alerting fields
/// exist for observability only and never affect ingestion success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    // ---
    pub reading: Reading,
    pub decision: Option<AlertDecision>,
    pub dispatch: Option<DispatchResult>,
    /// Set when evaluation could not run (e.g. unusable capacity). The
    /// write has still succeeded; this is a data-quality signal.
    pub evaluation_error: Option<String>,
}

/// Ingest one validated reading for a known tank.
///
/// The store write is the primary operation: a [`EngineError::Store`]
/// failure propagates and nothing else runs. Evaluation and dispatch are
/// secondary — evaluation errors are surfaced in the report and logged,
/// dispatch failures are recorded inside [`DispatchResult`]. Telemetry
/// write success is independent of alert delivery.
pub async fn ingest_reading<S, N>(
    store: &S,
    notifier: &N,
    tank: &Tank,
    reading: Reading,
    ops_address: &str,
) -> Result<IngestReport, EngineError>
where
    S: ReadingStore,
    N: Notifier,
{
    // ---
    store.write_reading(reading.clone()).await?;

    let (decision, evaluation_error) = match evaluate(&reading, tank.capacity_liters) {
        Ok(decision) => (decision, None),
        Err(e) => {
            tracing::warn!(
                tank_id = %tank.tank_id,
                kind = reading.kind.as_str(),
                error = %e,
                "reading stored but could not be evaluated"
            );
            (None, Some(e.to_string()))
        }
    };

    let dispatch_result = match &decision {
        Some(decision) => {
            Some(dispatch(notifier, decision, tank, ops_address, reading.captured_at).await)
        }
        None => None,
    };

    Ok(IngestReport {
        reading,
        decision,
        dispatch: dispatch_result,
        evaluation_error,
    })
}

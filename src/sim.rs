//! Simulated tank telemetry.
//!
//! Stand-in for real sensor ingestion: the scheduler draws readings from
//! these generators and pushes them through the same pipeline the HTTP
//! ingestion handlers use, so swapping in live sensors touches neither the
//! evaluator nor the aggregator.
//!
//! The quality generator classifies its own samples. That boundary
//! (`tds > 500 || ph < 5 || ph > 8`) is intentionally encoded here,
//! separately from the evaluator, which reacts only to the carried status —
//! generation-time classification and alert-time reaction are different
//! responsibilities in this product.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{QualityStatus, Reading, ReadingKind, Tank};

// ---

/// Per-tick drain, as a fraction of capacity.
pub const DRAIN_MIN_FRACTION: f32 = 0.01;
pub const DRAIN_MAX_FRACTION: f32 = 0.10;

/// Dropping below this fraction of capacity triggers the simulated
/// auto-refill back to 100%.
pub const REFILL_TRIGGER_FRACTION: f32 = 0.20;

/// Quality bounds used at generation time.
pub const UNSAFE_TDS_ABOVE: f32 = 500.0;
pub const SAFE_PH_MIN: f32 = 5.0;
pub const SAFE_PH_MAX: f32 = 8.0;

// ---

/// Next simulated water level for a tank.
///
/// Each tick drains a uniform 1–10% of capacity from the previous level; a
/// result below 20% of capacity resets to full, modeling the automatic
/// refill that the daily aggregator later counts as refill cycles. A tank
/// with no previous level starts full.
pub fn next_level<R: Rng>(rng: &mut R, capacity: f32, previous_level: Option<f32>) -> f32 {
    // ---
    let previous = previous_level.unwrap_or(capacity);
    let drained = previous - capacity * rng.gen_range(DRAIN_MIN_FRACTION..=DRAIN_MAX_FRACTION);
    if drained < capacity * REFILL_TRIGGER_FRACTION {
        capacity
    } else {
        drained
    }
}

/// One simulated quality sample: pH, TDS, and the generation-time
/// classification.
pub fn next_quality<R: Rng>(rng: &mut R) -> (f32, f32, QualityStatus) {
    // ---
    let ph_level = rng.gen_range(4.0f32..=10.0);
    let tds = rng.gen_range(0.0f32..=1000.0);
    let status = if tds > UNSAFE_TDS_ABOVE || ph_level < SAFE_PH_MIN || ph_level > SAFE_PH_MAX {
        QualityStatus::Unsafe
    } else {
        QualityStatus::Safe
    };
    (ph_level, tds, status)
}

// ---

/// Wrap a simulated level in a storable [`Reading`].
pub fn level_reading(tank: &Tank, current_level: f32, captured_at: DateTime<Utc>) -> Reading {
    // ---
    Reading {
        tank_id: tank.tank_id.clone(),
        kind: ReadingKind::Level,
        current_level: Some(current_level),
        capacity_override: None,
        ph_level: None,
        tds: None,
        status: None,
        captured_at,
    }
}

/// Wrap a simulated quality sample in a storable [`Reading`].
pub fn quality_reading(
    tank: &Tank,
    ph_level: f32,
    tds: f32,
    status: QualityStatus,
    captured_at: DateTime<Utc>,
) -> Reading {
    // ---
    Reading {
        tank_id: tank.tank_id.clone(),
        kind: ReadingKind::Quality,
        current_level: None,
        capacity_override: None,
        ph_level: Some(ph_level),
        tds: Some(tds),
        status: Some(status.as_str().to_string()),
        captured_at,
    }
}

//! Data models for the tank telemetry pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

// ---

/// Kind of telemetry a reading carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Level,
    Quality,
}

impl ReadingKind {
    // ---
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingKind::Level => "level",
            ReadingKind::Quality => "quality",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "level" => Ok(ReadingKind::Level),
            "quality" => Ok(ReadingKind::Quality),
            other => Err(EngineError::validation(format!(
                "unknown reading kind '{}'",
                other
            ))),
        }
    }
}

/// Water-quality classification carried by quality readings.
///
/// Input is accepted case-insensitively ("Unsafe", "UNSAFE", ...) and stored
/// normalized lowercase. Any value outside safe/unsafe is a validation error
/// at ingest, never an alerting case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Safe,
    Unsafe,
}

impl QualityStatus {
    // ---
    pub fn as_str(self) -> &'static str {
        match self {
            QualityStatus::Safe => "safe",
            QualityStatus::Unsafe => "unsafe",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        if s.eq_ignore_ascii_case("safe") {
            Ok(QualityStatus::Safe)
        } else if s.eq_ignore_ascii_case("unsafe") {
            Ok(QualityStatus::Unsafe)
        } else {
            Err(EngineError::validation(format!(
                "unrecognized quality status '{}'",
                s
            )))
        }
    }
}

// ---

/// A registered tank. Created by the registration route; read-only to the
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tank {
    // ---
    pub tank_id: String,
    /// Nominal capacity in liters.
    pub capacity_liters: f32,
    /// Contact address for tenant alerts, if registered.
    pub contact_email: Option<String>,
}

/// One validated, timestamped measurement for a tank.
///
/// Level and quality readings share this flat shape; the fields that do not
/// apply to a kind stay `None`. Out-of-order `captured_at` values are
/// accepted on write; aggregation sorts before grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub tank_id: String,
    pub kind: ReadingKind,
    /// Water level in liters (level readings).
    pub current_level: Option<f32>,
    /// Capacity carried by the reading itself. When present it wins over the
    /// tank record during threshold evaluation.
    pub capacity_override: Option<f32>,
    /// pH, 0..=14 (quality readings).
    pub ph_level: Option<f32>,
    /// Total dissolved solids in mg/L, 0..=1000 (quality readings).
    pub tds: Option<f32>,
    /// Normalized status: free-form tag for level readings, "safe"/"unsafe"
    /// for quality readings.
    pub status: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl Reading {
    /// Parse the normalized quality status, if this is a quality reading.
    pub fn quality_status(&self) -> Option<QualityStatus> {
        match self.kind {
            ReadingKind::Quality => self
                .status
                .as_deref()
                .and_then(|s| QualityStatus::parse(s).ok()),
            ReadingKind::Level => None,
        }
    }
}

// ---

/// Raw level reading from the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLevelReading {
    // ---
    pub tank_id: String,
    pub current_level: f32,
    /// Optional reading-carried capacity override.
    pub capacity: Option<f32>,
    pub status: Option<String>,
    /// Defaults to ingest time when the sensor did not stamp the sample.
    pub captured_at: Option<DateTime<Utc>>,
}

impl RawLevelReading {
    /// Validate and convert into a storable [`Reading`].
    pub fn validate(self, ingested_at: DateTime<Utc>) -> Result<Reading, EngineError> {
        // ---
        if self.tank_id.trim().is_empty() {
            return Err(EngineError::validation("tank_id must not be empty"));
        }
        if !self.current_level.is_finite() || self.current_level < 0.0 {
            return Err(EngineError::validation(format!(
                "current_level must be a non-negative number, got {}",
                self.current_level
            )));
        }
        if let Some(cap) = self.capacity {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(EngineError::validation(format!(
                    "capacity must be a positive number, got {}",
                    cap
                )));
            }
        }

        Ok(Reading {
            tank_id: self.tank_id,
            kind: ReadingKind::Level,
            current_level: Some(self.current_level),
            capacity_override: self.capacity,
            ph_level: None,
            tds: None,
            status: self.status,
            captured_at: self.captured_at.unwrap_or(ingested_at),
        })
    }
}

/// Raw quality reading from the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQualityReading {
    // ---
    pub tank_id: String,
    pub ph_level: f32,
    pub tds: f32,
    pub status: String,
    pub captured_at: Option<DateTime<Utc>>,
}

impl RawQualityReading {
    /// Validate and convert into a storable [`Reading`].
    ///
    /// The status string is normalized to lowercase; pH and TDS are range
    /// checked and never silently coerced.
    pub fn validate(self, ingested_at: DateTime<Utc>) -> Result<Reading, EngineError> {
        // ---
        if self.tank_id.trim().is_empty() {
            return Err(EngineError::validation("tank_id must not be empty"));
        }
        if !self.ph_level.is_finite() || !(0.0..=14.0).contains(&self.ph_level) {
            return Err(EngineError::validation(format!(
                "ph_level must be within 0..=14, got {}",
                self.ph_level
            )));
        }
        if !self.tds.is_finite() || !(0.0..=1000.0).contains(&self.tds) {
            return Err(EngineError::validation(format!(
                "tds must be within 0..=1000 mg/L, got {}",
                self.tds
            )));
        }
        let status = QualityStatus::parse(&self.status)?;

        Ok(Reading {
            tank_id: self.tank_id,
            kind: ReadingKind::Quality,
            current_level: None,
            capacity_override: None,
            ph_level: Some(self.ph_level),
            tds: Some(self.tds),
            status: Some(status.as_str().to_string()),
            captured_at: self.captured_at.unwrap_or(ingested_at),
        })
    }
}

// ---

/// One day's statistical summary of a tank's readings of one kind.
///
/// Derived on demand from reading history, never hand-edited, recomputable
/// at any time. The calendar date is taken under the aggregation offset
/// configured for the service (UTC by default).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    // ---
    pub tank_id: String,
    pub date: NaiveDate,
    pub kind: ReadingKind,
    /// Mean of the kind's primary value: liters for level, pH for quality.
    pub average_value: f64,
    /// Count of level readings at or above 98% of capacity that day.
    pub refill_cycles: u32,
    pub sample_count: u32,
    /// Most frequent status of the day (quality readings only), ties broken
    /// by earliest capture time.
    pub status_mode: Option<QualityStatus>,
}

/// A billed date range, derived from level aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingPeriod {
    // ---
    pub tank_id: String,
    pub period_start: NaiveDate,
    /// Exclusive end of the period.
    pub period_end: NaiveDate,
    pub total_refill_cycles: u32,
    pub total_charge: f64,
}

/// Ephemeral record of one alert dispatch. Exists only for the duration of
/// the dispatch call; its recipient list is the in-call dedup scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    // ---
    pub id: Uuid,
    pub tank_id: String,
    pub rule: &'static str,
    pub severity: crate::engine::Severity,
    pub recipients: Vec<String>,
    pub fired_at: DateTime<Utc>,
}

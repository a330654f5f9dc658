//! Threshold evaluation: one reading in, at most one alert decision out.
//!
//! Evaluation is stateless and per-reading. There is no smoothing,
//! hysteresis, or cross-reading debouncing: a tank oscillating around the
//! low-level threshold alerts on every qualifying reading. That is the
//! documented product behavior, matched here.

use serde::Serialize;

use crate::error::EngineError;
use crate::models::{QualityStatus, Reading, ReadingKind};

// ---

/// Low-level alerts fire strictly below this fill percentage.
pub const LOW_LEVEL_PERCENT: f32 = 25.0;

/// Severity attached to an alert decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The decision produced when a reading breaches a safety rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AlertDecision {
    /// Water level dropped below [`LOW_LEVEL_PERCENT`] of capacity.
    LowLevel {
        current_level: f32,
        capacity: f32,
        percentage: f32,
    },
    /// A quality reading arrived flagged unsafe.
    UnsafeQuality { ph_level: f32, tds: f32 },
}

impl AlertDecision {
    // ---
    pub fn rule(&self) -> &'static str {
        match self {
            AlertDecision::LowLevel { .. } => "low_level",
            AlertDecision::UnsafeQuality { .. } => "unsafe_quality",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertDecision::LowLevel { .. } => Severity::Warning,
            AlertDecision::UnsafeQuality { .. } => Severity::Critical,
        }
    }

    /// Human-readable summary of the measured values behind the decision.
    pub fn describe(&self) -> String {
        match self {
            AlertDecision::LowLevel {
                current_level,
                capacity,
                percentage,
            } => format!(
                "water level at {:.1} L of {:.1} L capacity ({:.1}%)",
                current_level, capacity, percentage
            ),
            AlertDecision::UnsafeQuality { ph_level, tds } => {
                format!("water flagged unsafe (pH {:.2}, TDS {:.0} mg/L)", ph_level, tds)
            }
        }
    }
}

// ---

/// Evaluate a single reading against the safety thresholds.
///
/// For level readings the effective capacity is the reading's own
/// `capacity_override` when present, else `tank_capacity` from the tank
/// record. A non-positive effective capacity is a configuration error: no
/// percentage can be computed, so no alert is emitted and the caller gets
/// the error to surface.
pub fn evaluate(reading: &Reading, tank_capacity: f32) -> Result<Option<AlertDecision>, EngineError> {
    // ---
    match reading.kind {
        ReadingKind::Level => {
            let current_level = reading.current_level.ok_or_else(|| {
                EngineError::validation("level reading is missing current_level")
            })?;
            let capacity = reading.capacity_override.unwrap_or(tank_capacity);
            if !capacity.is_finite() || capacity <= 0.0 {
                return Err(EngineError::configuration(format!(
                    "tank '{}' has no usable capacity ({}); cannot compute fill percentage",
                    reading.tank_id, capacity
                )));
            }

            let percentage = current_level / capacity * 100.0;
            if percentage < LOW_LEVEL_PERCENT {
                Ok(Some(AlertDecision::LowLevel {
                    current_level,
                    capacity,
                    percentage,
                }))
            } else {
                Ok(None)
            }
        }
        ReadingKind::Quality => {
            let status = reading
                .status
                .as_deref()
                .ok_or_else(|| EngineError::validation("quality reading is missing status"))?;
            match QualityStatus::parse(status)? {
                QualityStatus::Unsafe => {
                    let ph_level = reading.ph_level.ok_or_else(|| {
                        EngineError::validation("quality reading is missing ph_level")
                    })?;
                    let tds = reading
                        .tds
                        .ok_or_else(|| EngineError::validation("quality reading is missing tds"))?;
                    Ok(Some(AlertDecision::UnsafeQuality { ph_level, tds }))
                }
                QualityStatus::Safe => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Utc};

    fn level_reading(level: f32, capacity_override: Option<f32>) -> Reading {
        // ---
        Reading {
            tank_id: "tank-1".to_string(),
            kind: ReadingKind::Level,
            current_level: Some(level),
            capacity_override,
            ph_level: None,
            tds: None,
            status: None,
            captured_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
        }
    }

    fn quality_reading(ph: f32, tds: f32, status: &str) -> Reading {
        // ---
        Reading {
            tank_id: "tank-1".to_string(),
            kind: ReadingKind::Quality,
            current_level: None,
            capacity_override: None,
            ph_level: Some(ph),
            tds: Some(tds),
            status: Some(status.to_string()),
            captured_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_low_level_fires_strictly_below_25_percent() {
        // ---
        // 249 of 1000 L = 24.9% -> warning
        let decision = evaluate(&level_reading(249.0, None), 1000.0).unwrap();
        match decision {
            Some(AlertDecision::LowLevel { percentage, .. }) => {
                assert!((percentage - 24.9).abs() < 1e-4);
            }
            other => panic!("expected LowLevel, got {:?}", other),
        }

        // Exactly 25% does not fire
        assert_eq!(evaluate(&level_reading(250.0, None), 1000.0).unwrap(), None);

        // Well above threshold
        assert_eq!(evaluate(&level_reading(900.0, None), 1000.0).unwrap(), None);
    }

    #[test]
    fn test_low_level_severity_is_warning() {
        // ---
        let decision = evaluate(&level_reading(10.0, None), 1000.0)
            .unwrap()
            .expect("should fire");
        assert_eq!(decision.severity(), Severity::Warning);
        assert_eq!(decision.rule(), "low_level");
    }

    #[test]
    fn test_reading_carried_capacity_wins_over_tank_record() {
        // ---
        // 240 L is 24% of the override capacity (1000) but 48% of the tank
        // record capacity (500): the override decides.
        let reading = level_reading(240.0, Some(1000.0));
        assert!(evaluate(&reading, 500.0).unwrap().is_some());

        // And the other way around.
        let reading = level_reading(240.0, Some(500.0));
        assert_eq!(evaluate(&reading, 1000.0).unwrap(), None);
    }

    #[test]
    fn test_zero_capacity_is_a_configuration_error_not_a_crash() {
        // ---
        let err = evaluate(&level_reading(100.0, None), 0.0).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));

        let err = evaluate(&level_reading(100.0, None), f32::NAN).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_unsafe_quality_fires_critical_with_measured_values() {
        // ---
        let decision = evaluate(&quality_reading(4.2, 620.0, "unsafe"), 1000.0)
            .unwrap()
            .expect("should fire");
        assert_eq!(decision.severity(), Severity::Critical);
        match decision {
            AlertDecision::UnsafeQuality { ph_level, tds } => {
                assert_eq!(ph_level, 4.2);
                assert_eq!(tds, 620.0);
            }
            other => panic!("expected UnsafeQuality, got {:?}", other),
        }
    }

    #[test]
    fn test_safe_quality_any_case_does_not_fire() {
        // ---
        for spelling in ["safe", "Safe", "SAFE"] {
            assert_eq!(
                evaluate(&quality_reading(7.0, 100.0, spelling), 1000.0).unwrap(),
                None
            );
        }
        // Unsafe fires regardless of case too.
        for spelling in ["unsafe", "Unsafe", "UNSAFE"] {
            assert!(evaluate(&quality_reading(7.0, 100.0, spelling), 1000.0)
                .unwrap()
                .is_some());
        }
    }

    #[test]
    fn test_unknown_status_is_rejected_not_evaluated() {
        // ---
        let err = evaluate(&quality_reading(7.0, 100.0, "questionable"), 1000.0).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}

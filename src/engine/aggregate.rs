//! Daily aggregation: fold a tank's raw readings into per-day summaries.
//!
//! Calendar days are taken under an injected fixed UTC offset rather than
//! whatever zone the host happens to run in. The service default is UTC
//! (`AGG_UTC_OFFSET_MINUTES = 0`); dashboards that want tank-local days set
//! the offset. This is deliberate: implicit local-zone grouping is a
//! recurring source of off-by-one-day drift at midnight boundaries.

use std::collections::BTreeMap;

use chrono::FixedOffset;

use crate::error::EngineError;
use crate::models::{DailyAggregate, QualityStatus, Reading, ReadingKind};

// ---

/// A level reading at or above this fraction of capacity counts as one
/// refill cycle.
pub const REFILL_LEVEL_RATIO: f64 = 0.98;

/// Fold readings into one [`DailyAggregate`] per calendar day.
///
/// Readings are filtered to `tank_id` + `kind`, sorted by capture time
/// (out-of-order input is expected), and grouped by the calendar date of
/// `captured_at` under `offset`. Output is sorted by date; the whole
/// computation is deterministic, so re-running on the same reading set
/// yields identical rows regardless of input order.
///
/// Refill counting is per-reading, not edge-triggered: a tank pinned at 99%
/// for ten consecutive readings counts ten cycles that day.
pub fn aggregate(
    tank_id: &str,
    kind: ReadingKind,
    readings: &[Reading],
    capacity: f32,
    offset: FixedOffset,
) -> Result<Vec<DailyAggregate>, EngineError> {
    // ---
    if kind == ReadingKind::Level && (!capacity.is_finite() || capacity <= 0.0) {
        return Err(EngineError::configuration(format!(
            "tank '{}' has no usable capacity ({}); cannot count refill cycles",
            tank_id, capacity
        )));
    }

    let mut selected: Vec<&Reading> = readings
        .iter()
        .filter(|r| r.tank_id == tank_id && r.kind == kind)
        .collect();
    selected.sort_by_key(|r| r.captured_at);

    let mut by_date: BTreeMap<chrono::NaiveDate, Vec<&Reading>> = BTreeMap::new();
    for reading in selected {
        let date = reading.captured_at.with_timezone(&offset).date_naive();
        by_date.entry(date).or_default().push(reading);
    }

    let refill_threshold = REFILL_LEVEL_RATIO * capacity as f64;

    let mut aggregates = Vec::with_capacity(by_date.len());
    for (date, day) in by_date {
        let aggregate = match kind {
            ReadingKind::Level => {
                let mut sum = 0.0f64;
                let mut refill_cycles = 0u32;
                for reading in &day {
                    let level = reading.current_level.ok_or_else(|| {
                        EngineError::validation(format!(
                            "level reading for tank '{}' at {} is missing current_level",
                            tank_id, reading.captured_at
                        ))
                    })? as f64;
                    sum += level;
                    if level >= refill_threshold {
                        refill_cycles += 1;
                    }
                }
                DailyAggregate {
                    tank_id: tank_id.to_string(),
                    date,
                    kind,
                    average_value: sum / day.len() as f64,
                    refill_cycles,
                    sample_count: day.len() as u32,
                    status_mode: None,
                }
            }
            ReadingKind::Quality => {
                let mut sum = 0.0f64;
                for reading in &day {
                    let ph = reading.ph_level.ok_or_else(|| {
                        EngineError::validation(format!(
                            "quality reading for tank '{}' at {} is missing ph_level",
                            tank_id, reading.captured_at
                        ))
                    })? as f64;
                    sum += ph;
                }
                DailyAggregate {
                    tank_id: tank_id.to_string(),
                    date,
                    kind,
                    average_value: sum / day.len() as f64,
                    refill_cycles: 0,
                    sample_count: day.len() as u32,
                    status_mode: status_mode(&day)?,
                }
            }
        };
        aggregates.push(aggregate);
    }

    Ok(aggregates)
}

/// Most frequent status of the day. The input slice is already in capture
/// order, so on a tie the status seen earliest wins.
fn status_mode(day: &[&Reading]) -> Result<Option<QualityStatus>, EngineError> {
    // ---
    let mut counts: Vec<(QualityStatus, usize, usize)> = Vec::new(); // (status, count, first_seen)
    for (index, reading) in day.iter().enumerate() {
        let status = reading
            .status
            .as_deref()
            .ok_or_else(|| EngineError::validation("quality reading is missing status"))?;
        let status = QualityStatus::parse(status)?;
        match counts.iter_mut().find(|(s, _, _)| *s == status) {
            Some((_, count, _)) => *count += 1,
            None => counts.push((status, 1, index)),
        }
    }

    Ok(counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
        .map(|(status, _, _)| status))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn level(level: f32, captured_at: DateTime<Utc>) -> Reading {
        // ---
        Reading {
            tank_id: "tank-1".to_string(),
            kind: ReadingKind::Level,
            current_level: Some(level),
            capacity_override: None,
            ph_level: None,
            tds: None,
            status: None,
            captured_at,
        }
    }

    fn quality(ph: f32, status: &str, captured_at: DateTime<Utc>) -> Reading {
        // ---
        Reading {
            tank_id: "tank-1".to_string(),
            kind: ReadingKind::Quality,
            current_level: None,
            capacity_override: None,
            ph_level: Some(ph),
            tds: Some(100.0),
            status: Some(status.to_string()),
            captured_at,
        }
    }

    #[test]
    fn test_day_average_and_refill_cycles() {
        // ---
        // Capacity 1000 L, one day of [500, 990, 985, 100]:
        // average 643.75, and two readings at/above 980 (98%).
        let readings = vec![
            level(500.0, at(10, 6)),
            level(990.0, at(10, 10)),
            level(985.0, at(10, 14)),
            level(100.0, at(10, 18)),
        ];

        let days = aggregate("tank-1", ReadingKind::Level, &readings, 1000.0, utc()).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].average_value, 643.75);
        assert_eq!(days[0].refill_cycles, 2);
        assert_eq!(days[0].sample_count, 4);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    }

    #[test]
    fn test_refill_counting_zero_one_and_many() {
        // ---
        let capacity = 1000.0;

        // Zero qualifying readings.
        let none = vec![level(500.0, at(10, 6)), level(979.9, at(10, 10))];
        let days = aggregate("tank-1", ReadingKind::Level, &none, capacity, utc()).unwrap();
        assert_eq!(days[0].refill_cycles, 0);

        // Exactly one, right at the 98% boundary.
        let one = vec![level(980.0, at(10, 6))];
        let days = aggregate("tank-1", ReadingKind::Level, &one, capacity, utc()).unwrap();
        assert_eq!(days[0].refill_cycles, 1);

        // A tank pinned at 99% counts every reading, not one crossing.
        let pinned: Vec<Reading> = (0..10).map(|h| level(990.0, at(10, 6 + h))).collect();
        let days = aggregate("tank-1", ReadingKind::Level, &pinned, capacity, utc()).unwrap();
        assert_eq!(days[0].refill_cycles, 10);
    }

    #[test]
    fn test_grouping_splits_on_calendar_day() {
        // ---
        let readings = vec![
            level(800.0, at(10, 23)),
            level(600.0, at(11, 1)),
            level(400.0, at(11, 9)),
        ];

        let days = aggregate("tank-1", ReadingKind::Level, &readings, 1000.0, utc()).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].sample_count, 1);
        assert_eq!(days[1].sample_count, 2);
        assert_eq!(days[1].average_value, 500.0);
    }

    #[test]
    fn test_offset_moves_the_midnight_boundary() {
        // ---
        // 23:30 UTC on June 10 is already June 11 at UTC+2.
        let reading = level(800.0, Utc.with_ymd_and_hms(2025, 6, 10, 23, 30, 0).unwrap());
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let days = aggregate("tank-1", ReadingKind::Level, &[reading.clone()], 1000.0, utc())
            .unwrap();
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());

        let days =
            aggregate("tank-1", ReadingKind::Level, &[reading], 1000.0, plus_two).unwrap();
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 6, 11).unwrap());
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        // ---
        let mut readings = vec![
            level(500.0, at(10, 6)),
            level(990.0, at(10, 10)),
            level(985.0, at(10, 14)),
            level(100.0, at(11, 2)),
        ];

        let sorted = aggregate("tank-1", ReadingKind::Level, &readings, 1000.0, utc()).unwrap();
        readings.reverse();
        let reversed = aggregate("tank-1", ReadingKind::Level, &readings, 1000.0, utc()).unwrap();

        assert_eq!(sorted, reversed);
    }

    #[test]
    fn test_other_tanks_and_kinds_are_ignored() {
        // ---
        let mut readings = vec![level(500.0, at(10, 6))];
        let mut foreign = level(990.0, at(10, 7));
        foreign.tank_id = "tank-2".to_string();
        readings.push(foreign);
        readings.push(quality(7.0, "safe", at(10, 8)));

        let days = aggregate("tank-1", ReadingKind::Level, &readings, 1000.0, utc()).unwrap();
        assert_eq!(days[0].sample_count, 1);
        assert_eq!(days[0].average_value, 500.0);
    }

    #[test]
    fn test_quality_mode_prefers_majority_then_earliest() {
        // ---
        let majority = vec![
            quality(7.0, "safe", at(10, 6)),
            quality(4.0, "unsafe", at(10, 8)),
            quality(4.1, "unsafe", at(10, 10)),
        ];
        let days = aggregate("tank-1", ReadingKind::Quality, &majority, 0.0, utc()).unwrap();
        assert_eq!(days[0].status_mode, Some(QualityStatus::Unsafe));

        // Tie: the status captured earliest wins, even if it arrives later
        // in the input vector.
        let tie = vec![
            quality(4.0, "unsafe", at(10, 9)),
            quality(7.0, "safe", at(10, 6)),
        ];
        let days = aggregate("tank-1", ReadingKind::Quality, &tie, 0.0, utc()).unwrap();
        assert_eq!(days[0].status_mode, Some(QualityStatus::Safe));
    }

    #[test]
    fn test_quality_average_is_mean_ph() {
        // ---
        let readings = vec![
            quality(6.0, "safe", at(10, 6)),
            quality(8.0, "safe", at(10, 10)),
        ];
        let days = aggregate("tank-1", ReadingKind::Quality, &readings, 0.0, utc()).unwrap();
        assert_eq!(days[0].average_value, 7.0);
        assert_eq!(days[0].refill_cycles, 0);
    }

    #[test]
    fn test_zero_capacity_errors_for_level_aggregation() {
        // ---
        let readings = vec![level(500.0, at(10, 6))];
        let err = aggregate("tank-1", ReadingKind::Level, &readings, 0.0, utc()).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_no_readings_yields_no_rows() {
        // ---
        let days = aggregate("tank-1", ReadingKind::Level, &[], 1000.0, utc()).unwrap();
        assert!(days.is_empty());
    }
}

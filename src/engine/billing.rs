//! Billing: sum refill-cycle charges over a date range.
//!
//! The per-day charge is `refill_cycles * capacity / 1000 * rate_per_unit`,
//! i.e. every refill cycle bills one full tank of water, metered in
//! 1000-liter units. The rate is injected from configuration
//! (`BILLING_RATE_PER_UNIT`), not hardcoded at the call sites.

use chrono::{Datelike, NaiveDate};

use crate::error::EngineError;
use crate::models::{BillingPeriod, DailyAggregate, ReadingKind};

// ---

/// Compute the bill for `[period_start, period_end)` from level aggregates.
///
/// Rows outside the period, for other tanks, or of the quality kind are
/// ignored. A period with no matching rows is a zero bill, not an error.
pub fn bill(
    tank_id: &str,
    capacity: f32,
    daily_aggregates: &[DailyAggregate],
    period_start: NaiveDate,
    period_end: NaiveDate,
    rate_per_unit: f64,
) -> Result<BillingPeriod, EngineError> {
    // ---
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(EngineError::configuration(format!(
            "tank '{}' has no usable capacity ({}); cannot compute charges",
            tank_id, capacity
        )));
    }
    if period_end < period_start {
        return Err(EngineError::validation(format!(
            "billing period end {} precedes start {}",
            period_end, period_start
        )));
    }

    let mut total_refill_cycles = 0u32;
    let mut total_charge = 0.0f64;
    for day in daily_aggregates {
        if day.tank_id != tank_id || day.kind != ReadingKind::Level {
            continue;
        }
        if day.date < period_start || day.date >= period_end {
            continue;
        }
        total_refill_cycles += day.refill_cycles;
        total_charge += day.refill_cycles as f64 * capacity as f64 / 1000.0 * rate_per_unit;
    }

    Ok(BillingPeriod {
        tank_id: tank_id.to_string(),
        period_start,
        period_end,
        total_refill_cycles,
        total_charge,
    })
}

// ---

/// Calendar-month bounds containing `day`: first of the month through first
/// of the next month (exclusive).
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ---
    let start = NaiveDate::from_ymd_opt(day.year(), day.month(), 1)
        .expect("first of an existing month is always valid");
    let end = if day.month() == 12 {
        NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1)
    }
    .expect("first of an existing month is always valid");
    (start, end)
}

/// Bounds of the calendar month before the one containing `day`.
///
/// "Current month" and "last month" are the two periods the product asks
/// for; both are plain [`bill`] calls with different bounds.
pub fn previous_month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ---
    let (current_start, _) = month_bounds(day);
    let last_day_of_previous = current_start.pred_opt().unwrap_or(current_start);
    month_bounds(last_day_of_previous)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn level_day(date: NaiveDate, refill_cycles: u32) -> DailyAggregate {
        // ---
        DailyAggregate {
            tank_id: "tank-1".to_string(),
            date,
            kind: ReadingKind::Level,
            average_value: 640.0,
            refill_cycles,
            sample_count: 24,
            status_mode: None,
        }
    }

    #[test]
    fn test_charge_formula() {
        // ---
        // Capacity 1000 L, rate 20 per 1000-liter unit, one day with two
        // refill cycles: (2 * 1000 / 1000) * 20 = 40.
        let days = vec![level_day(date(2025, 6, 10), 2)];
        let bill = bill(
            "tank-1",
            1000.0,
            &days,
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap();

        assert_eq!(bill.total_refill_cycles, 2);
        assert_eq!(bill.total_charge, 40.0);
    }

    #[test]
    fn test_charge_scales_with_capacity() {
        // ---
        // A 500 L tank bills half a unit per cycle: 3 * 500/1000 * 20 = 30.
        let days = vec![level_day(date(2025, 6, 10), 3)];
        let bill = bill(
            "tank-1",
            500.0,
            &days,
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap();

        assert_eq!(bill.total_charge, 30.0);
    }

    #[test]
    fn test_empty_period_bills_zero_not_error() {
        // ---
        let bill = bill(
            "tank-1",
            1000.0,
            &[],
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap();

        assert_eq!(bill.total_refill_cycles, 0);
        assert_eq!(bill.total_charge, 0.0);
    }

    #[test]
    fn test_period_bounds_are_half_open() {
        // ---
        let days = vec![
            level_day(date(2025, 5, 31), 1), // before
            level_day(date(2025, 6, 1), 1),  // first day, included
            level_day(date(2025, 6, 30), 1), // last day, included
            level_day(date(2025, 7, 1), 1),  // exclusive end
        ];
        let bill = bill(
            "tank-1",
            1000.0,
            &days,
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap();

        assert_eq!(bill.total_refill_cycles, 2);
        assert_eq!(bill.total_charge, 40.0);
    }

    #[test]
    fn test_other_tanks_and_quality_rows_are_ignored() {
        // ---
        let mut foreign = level_day(date(2025, 6, 10), 5);
        foreign.tank_id = "tank-2".to_string();
        let mut quality = level_day(date(2025, 6, 10), 0);
        quality.kind = ReadingKind::Quality;

        let days = vec![foreign, quality, level_day(date(2025, 6, 11), 1)];
        let bill = bill(
            "tank-1",
            1000.0,
            &days,
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap();

        assert_eq!(bill.total_refill_cycles, 1);
    }

    #[test]
    fn test_zero_capacity_is_a_configuration_error() {
        // ---
        let err = bill(
            "tank-1",
            0.0,
            &[],
            date(2025, 6, 1),
            date(2025, 7, 1),
            20.0,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_inverted_period_is_rejected() {
        // ---
        let err = bill(
            "tank-1",
            1000.0,
            &[],
            date(2025, 7, 1),
            date(2025, 6, 1),
            20.0,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_month_bounds() {
        // ---
        assert_eq!(
            month_bounds(date(2025, 6, 15)),
            (date(2025, 6, 1), date(2025, 7, 1))
        );
        // December wraps the year.
        assert_eq!(
            month_bounds(date(2025, 12, 31)),
            (date(2025, 12, 1), date(2026, 1, 1))
        );
    }

    #[test]
    fn test_previous_month_bounds() {
        // ---
        assert_eq!(
            previous_month_bounds(date(2025, 6, 15)),
            (date(2025, 5, 1), date(2025, 6, 1))
        );
        // January looks back across the year boundary.
        assert_eq!(
            previous_month_bounds(date(2025, 1, 2)),
            (date(2024, 12, 1), date(2025, 1, 1))
        );
    }
}

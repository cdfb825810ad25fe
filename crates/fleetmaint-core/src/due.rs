//! Due-status computation.
//!
//! Pure: the same interval, odometer, date, last record and activation
//! baseline always yield the same [`DueStatus`].

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  baseline::PairBaseline,
  interval::Interval,
  record::{MaintenanceRecord, RecordStatus},
};

/// When the next maintenance of a pair is due, and how far away that is.
///
/// Remaining values are signed; a negative value means overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DueStatus {
  pub due_km:         Option<i64>,
  pub due_date:       Option<NaiveDate>,
  pub km_remaining:   Option<i64>,
  pub days_remaining: Option<i64>,
}

impl DueStatus {
  /// Whether either axis has reached its due point.
  pub fn is_due(&self) -> bool {
    self.km_remaining.is_some_and(|r| r <= 0) || self.days_remaining.is_some_and(|r| r <= 0)
  }
}

/// The next due point counted from a baseline odometer reading and date.
pub fn next_due(
  interval: &Interval,
  baseline_km: i64,
  baseline_date: NaiveDate,
) -> (Option<i64>, Option<NaiveDate>) {
  let due_km = interval.km().map(|km| baseline_km.saturating_add(i64::from(km)));
  let due_date = interval.months().map(|months| {
    baseline_date
      .checked_add_months(Months::new(months))
      .unwrap_or(NaiveDate::MAX)
  });
  (due_km, due_date)
}

/// Compute the due status of a pair.
///
/// The baseline is the last completed record's odometer and execution date.
/// Without one, each axis falls back to the pair's activation baseline, and
/// only a pair never observed before counts from the current odometer and
/// `today`. Both axes are computed independently; severity classification
/// decides which one matters.
pub fn compute_due_status(
  interval: &Interval,
  odometer_km: i64,
  today: NaiveDate,
  last_completed: Option<&MaintenanceRecord>,
  activation: Option<&PairBaseline>,
) -> DueStatus {
  let last = last_completed.filter(|r| r.status == RecordStatus::Completed);

  let baseline_km = last
    .and_then(|r| r.vehicle_km_at_maintenance)
    .or(activation.map(|b| b.odometer_km))
    .unwrap_or(odometer_km);
  let baseline_date = last
    .and_then(|r| r.executed_date)
    .or(activation.map(|b| b.observed_on))
    .unwrap_or(today);

  let (due_km, due_date) = next_due(interval, baseline_km, baseline_date);

  DueStatus {
    due_km,
    due_date,
    km_remaining: due_km.map(|due| due - odometer_km),
    days_remaining: due_date.map(|due| (due - today).num_days()),
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroU32;

  use uuid::Uuid;

  use super::*;
  use crate::PairKey;

  fn km(n: u32) -> Interval { Interval::Km { km: NonZeroU32::new(n).unwrap() } }

  fn months(n: u32) -> Interval { Interval::Months { months: NonZeroU32::new(n).unwrap() } }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn completed(km_at: i64, executed: NaiveDate) -> MaintenanceRecord {
    let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut r = MaintenanceRecord::schedule(pair, Some(executed));
    r.status = RecordStatus::Completed;
    r.executed_date = Some(executed);
    r.vehicle_km_at_maintenance = Some(km_at);
    r
  }

  #[test]
  fn never_serviced_vehicle_counts_from_now() {
    let status = compute_due_status(&km(10_000), 45_000, date(2025, 3, 1), None, None);
    assert_eq!(status.due_km, Some(55_000));
    assert_eq!(status.km_remaining, Some(10_000));
    assert_eq!(status.due_date, None);
    assert_eq!(status.days_remaining, None);
  }

  #[test]
  fn never_serviced_vehicle_counts_from_activation() {
    let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let first_seen = date(2025, 1, 15).and_hms_opt(8, 0, 0).unwrap().and_utc();
    let activation = PairBaseline::observe(pair, 45_000, first_seen);
    let interval = Interval::Both {
      km:     NonZeroU32::new(10_000).unwrap(),
      months: NonZeroU32::new(6).unwrap(),
    };

    let status = compute_due_status(&interval, 56_000, date(2025, 8, 1), None, Some(&activation));
    assert_eq!(status.due_km, Some(55_000));
    assert_eq!(status.km_remaining, Some(-1_000));
    assert_eq!(status.due_date, Some(date(2025, 7, 15)));
    assert_eq!(status.days_remaining, Some(-17));
    assert!(status.is_due());
  }

  #[test]
  fn completed_record_outranks_activation() {
    let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let activation = PairBaseline::observe(pair, 10_000, chrono::Utc::now());
    let last = completed(40_000, date(2025, 1, 10));
    let status = compute_due_status(&km(10_000), 48_500, date(2025, 3, 1), Some(&last), Some(&activation));
    assert_eq!(status.due_km, Some(50_000));
  }

  #[test]
  fn last_completed_record_is_the_baseline() {
    let last = completed(40_000, date(2025, 1, 10));
    let status = compute_due_status(&km(10_000), 48_500, date(2025, 3, 1), Some(&last), None);
    assert_eq!(status.due_km, Some(50_000));
    assert_eq!(status.km_remaining, Some(1_500));
  }

  #[test]
  fn month_axis_counts_calendar_days() {
    let last = completed(40_000, date(2025, 1, 10));
    let status = compute_due_status(&months(6), 48_500, date(2025, 7, 1), Some(&last), None);
    assert_eq!(status.due_date, Some(date(2025, 7, 10)));
    assert_eq!(status.days_remaining, Some(9));
  }

  #[test]
  fn month_end_is_clamped() {
    let last = completed(0, date(2025, 8, 31));
    let status = compute_due_status(&months(6), 0, date(2025, 9, 1), Some(&last), None);
    assert_eq!(status.due_date, Some(date(2026, 2, 28)));
  }

  #[test]
  fn overdue_values_are_negative() {
    let last = completed(40_000, date(2024, 1, 1));
    let interval = Interval::Both {
      km:     NonZeroU32::new(10_000).unwrap(),
      months: NonZeroU32::new(6).unwrap(),
    };
    let status = compute_due_status(&interval, 51_200, date(2024, 7, 11), Some(&last), None);
    assert_eq!(status.km_remaining, Some(-1_200));
    assert_eq!(status.days_remaining, Some(-10));
    assert!(status.is_due());
  }

  #[test]
  fn identical_inputs_give_identical_status() {
    let last = completed(12_000, date(2025, 2, 2));
    let interval = Interval::Both {
      km:     NonZeroU32::new(15_000).unwrap(),
      months: NonZeroU32::new(12).unwrap(),
    };
    let a = compute_due_status(&interval, 20_000, date(2025, 6, 6), Some(&last), None);
    let b = compute_due_status(&interval, 20_000, date(2025, 6, 6), Some(&last), None);
    assert_eq!(a, b);
  }

  #[test]
  fn non_completed_record_is_not_a_baseline() {
    let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut scheduled = MaintenanceRecord::schedule(pair, Some(date(2025, 1, 1)));
    scheduled.vehicle_km_at_maintenance = Some(1_000);
    let status = compute_due_status(&km(10_000), 30_000, date(2025, 3, 1), Some(&scheduled), None);
    assert_eq!(status.due_km, Some(40_000));
  }
}

//! Alert severity classification.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{due::DueStatus, maintenance_type::AlertThresholds};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
  Km,
  Date,
  Overdue,
}

/// Escalation tier of an alert. Ordered: `Info < Warning < Critical`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
  Info,
  Warning,
  Critical,
}

/// The axis an alert was raised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
  Km,
  Date,
}

/// What the classifier wants the pair's active alert to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCandidate {
  pub alert_type: AlertType,
  pub severity:   Severity,
  pub axis:       Axis,
  /// Remaining km or days on the chosen axis; `<= 0` means due or overdue.
  pub remaining:  i64,
  /// The full due status the candidate was derived from.
  pub due:        DueStatus,
}

#[derive(Debug, Clone, Copy)]
struct AxisReading {
  axis:      Axis,
  severity:  Severity,
  remaining: i64,
  threshold: i64,
}

fn read_axis(axis: Axis, remaining: Option<i64>, threshold: u32) -> Option<AxisReading> {
  let remaining = remaining?;
  let threshold = i64::from(threshold);
  let severity = if remaining <= 0 {
    Severity::Critical
  } else if remaining <= threshold {
    Severity::Warning
  } else {
    return None;
  };
  Some(AxisReading { axis, severity, remaining, threshold })
}

/// Order two readings by urgency: `Less` means `a` is more urgent.
///
/// Higher severity first; within a tier, the smaller `remaining / threshold`
/// fraction. Thresholds of zero normalise as one.
fn urgency(a: &AxisReading, b: &AxisReading) -> Ordering {
  b.severity.cmp(&a.severity).then_with(|| {
    let lhs = i128::from(a.remaining) * i128::from(b.threshold.max(1));
    let rhs = i128::from(b.remaining) * i128::from(a.threshold.max(1));
    lhs.cmp(&rhs)
  })
}

/// Map a due status onto at most one alert candidate.
///
/// Each axis is CRITICAL once its remaining value reaches zero and WARNING
/// inside its lead threshold. When both axes fire the more urgent one wins,
/// with km preferred on an exact tie. Returns `None` when neither axis has
/// crossed its threshold; callers must leave any existing alert alone in
/// that case.
pub fn classify(due: &DueStatus, thresholds: &AlertThresholds) -> Option<AlertCandidate> {
  let km = read_axis(Axis::Km, due.km_remaining, thresholds.before_km);
  let date = read_axis(Axis::Date, due.days_remaining, thresholds.before_days);

  let chosen = match (km, date) {
    (Some(k), Some(d)) => {
      if urgency(&d, &k) == Ordering::Less { d } else { k }
    }
    (Some(only), None) | (None, Some(only)) => only,
    (None, None) => return None,
  };

  let alert_type = if chosen.remaining <= 0 {
    AlertType::Overdue
  } else {
    match chosen.axis {
      Axis::Km => AlertType::Km,
      Axis::Date => AlertType::Date,
    }
  };

  Some(AlertCandidate {
    alert_type,
    severity: chosen.severity,
    axis: chosen.axis,
    remaining: chosen.remaining,
    due: *due,
  })
}

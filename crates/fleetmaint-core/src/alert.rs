//! Maintenance alerts and their lifecycle.
//!
//! An alert is a derived, mutable notice for a (vehicle, maintenance type)
//! pair. At most one alert per pair is active at a time. Alerts are never
//! deleted and never revived: dismissal (by a user, or by the system when a
//! record completion supersedes it) is final, and a later due condition
//! produces a fresh alert row.
//!
//! The functions here only decide what should happen; the store-backed
//! engine applies the decision under the pair's lock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  PairKey,
  severity::{AlertCandidate, AlertType, Severity},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Who dismissed an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Dismisser {
  User(Uuid),
  /// Superseded by a completed maintenance record.
  System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertStatus {
  Active,
  Dismissed { by: Dismisser, at: DateTime<Utc> },
}

impl AlertStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAlert {
  pub alert_id:       Uuid,
  pub tenant_id:      Uuid,
  pub vehicle_id:     Uuid,
  pub type_id:        Uuid,
  pub alert_type:     AlertType,
  pub severity:       Severity,
  pub due_km:         Option<i64>,
  pub due_date:       Option<NaiveDate>,
  pub km_remaining:   Option<i64>,
  pub days_remaining: Option<i64>,
  pub status:         AlertStatus,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
  pub version:        i64,
}

impl MaintenanceAlert {
  pub fn from_candidate(pair: PairKey, candidate: &AlertCandidate, now: DateTime<Utc>) -> Self {
    Self {
      alert_id:       Uuid::new_v4(),
      tenant_id:      pair.tenant_id,
      vehicle_id:     pair.vehicle_id,
      type_id:        pair.type_id,
      alert_type:     candidate.alert_type,
      severity:       candidate.severity,
      due_km:         candidate.due.due_km,
      due_date:       candidate.due.due_date,
      km_remaining:   candidate.due.km_remaining,
      days_remaining: candidate.due.days_remaining,
      status:         AlertStatus::Active,
      created_at:     now,
      updated_at:     now,
      version:        1,
    }
  }

  pub fn pair(&self) -> PairKey { PairKey::new(self.tenant_id, self.vehicle_id, self.type_id) }

  pub fn is_active(&self) -> bool { self.status.is_active() }

  /// Whether the alert already says exactly what `candidate` says.
  pub fn matches(&self, candidate: &AlertCandidate) -> bool {
    self.alert_type == candidate.alert_type
      && self.severity == candidate.severity
      && self.due_km == candidate.due.due_km
      && self.due_date == candidate.due.due_date
      && self.km_remaining == candidate.due.km_remaining
      && self.days_remaining == candidate.due.days_remaining
  }

  fn same_due_target(&self, candidate: &AlertCandidate) -> bool {
    self.due_km == candidate.due.due_km && self.due_date == candidate.due.due_date
  }
}

// ─── Decisions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AlertDecision {
  /// Insert a new active alert.
  Create(MaintenanceAlert),
  /// Overwrite the active alert in place; identity and `created_at` kept.
  Update(MaintenanceAlert),
  /// The active alert already reflects the candidate.
  Unchanged,
  /// A user dismissed an alert for the same due point at this severity or
  /// above; raising it again would undo their dismissal. A candidate that
  /// only de-escalates below the dismissed severity is suppressed as well.
  /// Only a higher severity or a different due point raises a new alert.
  Suppressed,
}

/// Decide how a classifier candidate lands on the pair's alerts.
///
/// `active` is the pair's current active alert, `last_dismissed` the most
/// recently dismissed one. Re-running with unchanged inputs yields
/// [`AlertDecision::Unchanged`].
pub fn decide_upsert(
  pair: PairKey,
  active: Option<&MaintenanceAlert>,
  last_dismissed: Option<&MaintenanceAlert>,
  candidate: &AlertCandidate,
  now: DateTime<Utc>,
) -> AlertDecision {
  if let Some(active) = active {
    if active.matches(candidate) {
      return AlertDecision::Unchanged;
    }
    let mut next = active.clone();
    next.alert_type = candidate.alert_type;
    next.severity = candidate.severity;
    next.due_km = candidate.due.due_km;
    next.due_date = candidate.due.due_date;
    next.km_remaining = candidate.due.km_remaining;
    next.days_remaining = candidate.due.days_remaining;
    next.updated_at = now;
    next.version = active.version + 1;
    return AlertDecision::Update(next);
  }

  if let Some(dismissed) = last_dismissed
    && let AlertStatus::Dismissed { by: Dismisser::User(_), .. } = dismissed.status
    && dismissed.same_due_target(candidate)
    && dismissed.severity >= candidate.severity
  {
    return AlertDecision::Suppressed;
  }

  AlertDecision::Create(MaintenanceAlert::from_candidate(pair, candidate, now))
}

/// Dismiss `alert`. Returns `None` when it is already dismissed, which
/// callers treat as a successful no-op.
pub fn dismiss(
  alert: &MaintenanceAlert,
  by: Dismisser,
  now: DateTime<Utc>,
) -> Option<MaintenanceAlert> {
  if !alert.is_active() {
    return None;
  }
  let mut next = alert.clone();
  next.status = AlertStatus::Dismissed { by, at: now };
  next.updated_at = now;
  next.version = alert.version + 1;
  Some(next)
}

//! Maintenance records and their status state machine.
//!
//! ```text
//!   SCHEDULED ──complete──▶ COMPLETED   (terminal, immutable)
//!       │  │
//!       │  └──cancel────▶ CANCELLED     (terminal)
//!       │                     ▲
//!   (system) mark_overdue     │
//!       ▼                     │
//!    OVERDUE ───cancel────────┘
//!       └──────complete─────▶ COMPLETED
//! ```
//!
//! Transitions are computed here without touching storage. The caller
//! persists the returned record and, when [`TransitionOutcome::supersedes`]
//! is set, dismisses the pair's active alert.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, PairKey, Result,
  due::{DueStatus, next_due},
  interval::Interval,
  maintenance_type::MaintenanceClass,
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
  Scheduled,
  Completed,
  Overdue,
  Cancelled,
}

impl RecordStatus {
  pub fn is_terminal(&self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One scheduled or historical maintenance event for a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRecord {
  pub record_id:                 Uuid,
  pub tenant_id:                 Uuid,
  pub vehicle_id:                Uuid,
  /// Absent for corrective work that is not tied to a preventive policy.
  pub type_id:                   Option<Uuid>,
  pub class:                     MaintenanceClass,
  pub status:                    RecordStatus,
  pub scheduled_date:            Option<NaiveDate>,
  pub executed_date:             Option<NaiveDate>,
  pub vehicle_km_at_maintenance: Option<i64>,
  /// Next-due snapshot taken at completion; never recomputed afterwards.
  pub next_maintenance_km:       Option<i64>,
  pub next_maintenance_date:     Option<NaiveDate>,
  pub notes:                     Option<String>,
  pub cost_cents:                Option<i64>,
  pub created_at:                DateTime<Utc>,
  pub updated_at:                DateTime<Utc>,
  /// Optimistic concurrency token, bumped on every change.
  pub version:                   i64,
}

impl MaintenanceRecord {
  /// A new SCHEDULED preventive record for a pair.
  pub fn schedule(pair: PairKey, scheduled_date: Option<NaiveDate>) -> Self {
    Self::blank(
      pair.tenant_id,
      pair.vehicle_id,
      Some(pair.type_id),
      MaintenanceClass::Preventive,
      scheduled_date,
    )
  }

  /// A new SCHEDULED corrective record, not tied to a maintenance type.
  pub fn corrective(tenant_id: Uuid, vehicle_id: Uuid, scheduled_date: Option<NaiveDate>) -> Self {
    Self::blank(tenant_id, vehicle_id, None, MaintenanceClass::Corrective, scheduled_date)
  }

  fn blank(
    tenant_id: Uuid,
    vehicle_id: Uuid,
    type_id: Option<Uuid>,
    class: MaintenanceClass,
    scheduled_date: Option<NaiveDate>,
  ) -> Self {
    let now = Utc::now();
    Self {
      record_id: Uuid::new_v4(),
      tenant_id,
      vehicle_id,
      type_id,
      class,
      status: RecordStatus::Scheduled,
      scheduled_date,
      executed_date: None,
      vehicle_km_at_maintenance: None,
      next_maintenance_km: None,
      next_maintenance_date: None,
      notes: None,
      cost_cents: None,
      created_at: now,
      updated_at: now,
      version: 1,
    }
  }

  /// The (vehicle, type) pair this record schedules, if any.
  pub fn pair(&self) -> Option<PairKey> {
    self
      .type_id
      .map(|type_id| PairKey::new(self.tenant_id, self.vehicle_id, type_id))
  }

  /// Whether a SCHEDULED record should be flagged OVERDUE: its pair is due,
  /// or its scheduled date has gone by.
  pub fn is_past_due(&self, due: &DueStatus, today: NaiveDate) -> bool {
    self.status == RecordStatus::Scheduled
      && (due.is_due() || self.scheduled_date.is_some_and(|d| d < today))
  }

  fn ensure_editable(&self) -> Result<()> {
    if self.status.is_terminal() {
      return Err(Error::RecordImmutable(self.record_id, self.status));
    }
    Ok(())
  }
}

// ─── Transition requests ─────────────────────────────────────────────────────

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
  User(Uuid),
  System,
}

/// Data a user supplies when completing a record.
///
/// Both `executed_date` and `vehicle_km` are mandatory; they are optional
/// here so that incomplete submissions are rejected with a clear reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionPayload {
  pub executed_date: Option<NaiveDate>,
  pub vehicle_km:    Option<i64>,
  pub notes:         Option<String>,
  pub cost_cents:    Option<i64>,
}

impl CompletionPayload {
  pub fn new(executed_date: NaiveDate, vehicle_km: i64) -> Self {
    Self {
      executed_date: Some(executed_date),
      vehicle_km: Some(vehicle_km),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionRequest {
  Complete(CompletionPayload),
  Cancel { reason: Option<String> },
  /// System only; applied by the scheduling sweep.
  MarkOverdue,
}

impl TransitionRequest {
  pub fn target(&self) -> RecordStatus {
    match self {
      Self::Complete(_) => RecordStatus::Completed,
      Self::Cancel { .. } => RecordStatus::Cancelled,
      Self::MarkOverdue => RecordStatus::Overdue,
    }
  }
}

/// Ambient inputs of a transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
  pub actor:    Actor,
  pub now:      DateTime<Utc>,
  pub today:    NaiveDate,
  /// Effective interval of the record's pair, used for the next-due
  /// snapshot on completion. `None` for corrective work.
  pub interval: Option<Interval>,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
  pub from:       RecordStatus,
  pub record:     MaintenanceRecord,
  /// Pair whose active alert must be dismissed by the system.
  pub supersedes: Option<PairKey>,
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Apply `request` to `record`, returning the updated record.
///
/// The input record is left untouched; the returned record carries a bumped
/// `version`.
pub fn transition(
  record: &MaintenanceRecord,
  request: TransitionRequest,
  ctx: &TransitionContext,
) -> Result<TransitionOutcome> {
  let from = record.status;
  let to = request.target();

  if from.is_terminal() {
    return Err(Error::InvalidTransition { from, to });
  }

  let mut next = record.clone();
  let mut supersedes = None;

  match request {
    TransitionRequest::Complete(payload) => {
      let executed_date = payload
        .executed_date
        .ok_or_else(|| Error::InvalidPayload("executed date is required".into()))?;
      let km = payload
        .vehicle_km
        .ok_or_else(|| Error::InvalidPayload("odometer at maintenance is required".into()))?;

      if km < 0 {
        return Err(Error::InvalidPayload(format!("odometer cannot be negative: {km}")));
      }
      if executed_date > ctx.today {
        return Err(Error::InvalidPayload(format!(
          "executed date {executed_date} is in the future"
        )));
      }

      next.executed_date = Some(executed_date);
      next.vehicle_km_at_maintenance = Some(km);
      if payload.notes.is_some() {
        next.notes = payload.notes;
      }
      if payload.cost_cents.is_some() {
        next.cost_cents = payload.cost_cents;
      }

      let (due_km, due_date) = match (record.class, ctx.interval) {
        (MaintenanceClass::Preventive, Some(interval)) => next_due(&interval, km, executed_date),
        _ => (None, None),
      };
      next.next_maintenance_km = due_km;
      next.next_maintenance_date = due_date;

      supersedes = record.pair();
    }

    TransitionRequest::Cancel { reason } => {
      if let Some(reason) = reason {
        next.notes = Some(match next.notes.take() {
          Some(existing) => format!("{existing}\nCancelled: {reason}"),
          None => format!("Cancelled: {reason}"),
        });
      }
    }

    TransitionRequest::MarkOverdue => {
      if from != RecordStatus::Scheduled || ctx.actor != Actor::System {
        return Err(Error::InvalidTransition { from, to });
      }
    }
  }

  next.status = to;
  next.updated_at = ctx.now;
  next.version = record.version + 1;

  Ok(TransitionOutcome { from, record: next, supersedes })
}

// ─── Creation and edits ──────────────────────────────────────────────────────

/// A record as submitted by a user. With `completion` set, the record is
/// created directly in the COMPLETED state.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub tenant_id:      Uuid,
  pub vehicle_id:     Uuid,
  pub type_id:        Option<Uuid>,
  pub scheduled_date: Option<NaiveDate>,
  pub notes:          Option<String>,
  pub completion:     Option<CompletionPayload>,
}

/// Build a record from a user submission.
pub fn open_record(input: NewRecord, ctx: &TransitionContext) -> Result<TransitionOutcome> {
  let mut record = match input.type_id {
    Some(type_id) => MaintenanceRecord::schedule(
      PairKey::new(input.tenant_id, input.vehicle_id, type_id),
      input.scheduled_date,
    ),
    None => MaintenanceRecord::corrective(input.tenant_id, input.vehicle_id, input.scheduled_date),
  };
  record.notes = input.notes;
  record.created_at = ctx.now;
  record.updated_at = ctx.now;

  match input.completion {
    None => Ok(TransitionOutcome {
      from:       RecordStatus::Scheduled,
      record,
      supersedes: None,
    }),
    Some(payload) => {
      let mut outcome = transition(&record, TransitionRequest::Complete(payload), ctx)?;
      outcome.record.version = record.version;
      Ok(outcome)
    }
  }
}

/// Field changes on a not-yet-closed record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEdit {
  pub scheduled_date: Option<NaiveDate>,
  pub executed_date:  Option<NaiveDate>,
  pub vehicle_km:     Option<i64>,
  pub notes:          Option<String>,
  pub cost_cents:     Option<i64>,
}

/// Apply `edit` to an open record. Closed records are immutable.
pub fn apply_edit(
  record: &MaintenanceRecord,
  edit: RecordEdit,
  now: DateTime<Utc>,
) -> Result<MaintenanceRecord> {
  record.ensure_editable()?;

  if let Some(km) = edit.vehicle_km
    && km < 0
  {
    return Err(Error::InvalidPayload(format!("odometer cannot be negative: {km}")));
  }

  let mut next = record.clone();
  if edit.scheduled_date.is_some() {
    next.scheduled_date = edit.scheduled_date;
  }
  if edit.executed_date.is_some() {
    next.executed_date = edit.executed_date;
  }
  if edit.vehicle_km.is_some() {
    next.vehicle_km_at_maintenance = edit.vehicle_km;
  }
  if edit.notes.is_some() {
    next.notes = edit.notes;
  }
  if edit.cost_cents.is_some() {
    next.cost_cents = edit.cost_cents;
  }
  next.updated_at = now;
  next.version = record.version + 1;
  Ok(next)
}

//! Error types for `fleetmaint-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::record::RecordStatus;

/// A maintenance type or plan cannot produce a schedule.
///
/// Reported per (vehicle, type) pair; a sweep skips the pair and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("maintenance type {0} is corrective and has no interval")]
  NotScheduled(Uuid),

  #[error("maintenance type {0} resolves to neither a km nor a month interval")]
  NoInterval(Uuid),

  #[error("maintenance type {0} resolves to a zero {1} interval")]
  ZeroInterval(Uuid, &'static str),

  #[error("plan {plan} belongs to maintenance type {plan_type}, not {expected}")]
  PlanMismatch {
    plan:      Uuid,
    plan_type: Uuid,
    expected:  Uuid,
  },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("invalid transition from {from} to {to}")]
  InvalidTransition { from: RecordStatus, to: RecordStatus },

  #[error("maintenance record {0} is {1} and can no longer be edited")]
  RecordImmutable(Uuid, RecordStatus),

  #[error("invalid transition payload: {0}")]
  InvalidPayload(String),

  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: Uuid },

  #[error("concurrent modification of {kind} {id}")]
  ConcurrencyConflict { kind: &'static str, id: Uuid },

  #[error("vehicle {vehicle} already has a plan for maintenance type {maintenance_type}")]
  DuplicatePlan { vehicle: Uuid, maintenance_type: Uuid },

  #[error("odometer for vehicle {vehicle} cannot go back from {current} km to {proposed} km")]
  OdometerRegression { vehicle: Uuid, current: i64, proposed: i64 },
}

impl Error {
  pub fn alert_not_found(id: Uuid) -> Self { Self::NotFound { kind: "alert", id } }

  pub fn record_not_found(id: Uuid) -> Self { Self::NotFound { kind: "maintenance record", id } }

  /// Whether a caller may retry the operation against fresh state.
  pub fn is_conflict(&self) -> bool { matches!(self, Self::ConcurrencyConflict { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

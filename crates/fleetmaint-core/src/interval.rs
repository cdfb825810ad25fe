//! Interval resolution: type defaults merged with a per-vehicle plan.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::{
  ConfigError,
  maintenance_type::{IntervalKind, MaintenanceType},
  plan::VehicleMaintenancePlan,
};

/// The resolved cadence for one (vehicle, maintenance type) pair.
///
/// At least one axis is always present; the variants make the "neither"
/// state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interval {
  Km { km: NonZeroU32 },
  Months { months: NonZeroU32 },
  Both { km: NonZeroU32, months: NonZeroU32 },
}

impl Interval {
  pub fn km(&self) -> Option<u32> {
    match self {
      Self::Km { km } | Self::Both { km, .. } => Some(km.get()),
      Self::Months { .. } => None,
    }
  }

  pub fn months(&self) -> Option<u32> {
    match self {
      Self::Months { months } | Self::Both { months, .. } => Some(months.get()),
      Self::Km { .. } => None,
    }
  }
}

/// Merge a maintenance type's defaults with an optional plan override.
///
/// Each axis takes the plan's value when present, else the type default. The
/// interval kind then masks out the axis it does not schedule on, so a stray
/// month override on a km-only type is ignored. A disabled plan contributes
/// nothing.
pub fn resolve_interval(
  maintenance_type: &MaintenanceType,
  plan: Option<&VehicleMaintenancePlan>,
) -> Result<Interval, ConfigError> {
  let type_id = maintenance_type.type_id;

  if !maintenance_type.is_preventive() {
    return Err(ConfigError::NotScheduled(type_id));
  }

  if let Some(p) = plan
    && p.type_id != type_id
  {
    return Err(ConfigError::PlanMismatch {
      plan:      p.plan_id,
      plan_type: p.type_id,
      expected:  type_id,
    });
  }

  let plan = plan.filter(|p| p.enabled);

  let km = plan
    .and_then(|p| p.custom_km_interval)
    .or(maintenance_type.default_km_interval);
  let months = plan
    .and_then(|p| p.custom_month_interval)
    .or(maintenance_type.default_month_interval);

  let (km, months) = match maintenance_type.interval_kind {
    IntervalKind::Km => (km, None),
    IntervalKind::Months => (None, months),
    IntervalKind::Both => (km, months),
  };

  let km = km.map(|v| positive(v, type_id, "km")).transpose()?;
  let months = months.map(|v| positive(v, type_id, "month")).transpose()?;

  match (km, months) {
    (Some(km), Some(months)) => Ok(Interval::Both { km, months }),
    (Some(km), None) => Ok(Interval::Km { km }),
    (None, Some(months)) => Ok(Interval::Months { months }),
    (None, None) => Err(ConfigError::NoInterval(type_id)),
  }
}

fn positive(value: u32, type_id: uuid::Uuid, axis: &'static str) -> Result<NonZeroU32, ConfigError> {
  NonZeroU32::new(value).ok_or(ConfigError::ZeroInterval(type_id, axis))
}

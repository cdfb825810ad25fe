//! Per-vehicle overrides of a maintenance type's interval policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PairKey;

/// Optional override for one (vehicle, maintenance type) pair.
///
/// At most one plan exists per pair; stores reject a second one with
/// [`Error::DuplicatePlan`](crate::Error::DuplicatePlan).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleMaintenancePlan {
  pub plan_id:               Uuid,
  pub tenant_id:             Uuid,
  pub vehicle_id:            Uuid,
  pub type_id:               Uuid,
  pub enabled:               bool,
  pub custom_km_interval:    Option<u32>,
  pub custom_month_interval: Option<u32>,
  pub created_at:            DateTime<Utc>,
}

impl VehicleMaintenancePlan {
  pub fn new(pair: PairKey) -> Self {
    Self {
      plan_id:               Uuid::new_v4(),
      tenant_id:             pair.tenant_id,
      vehicle_id:            pair.vehicle_id,
      type_id:               pair.type_id,
      enabled:               true,
      custom_km_interval:    None,
      custom_month_interval: None,
      created_at:            Utc::now(),
    }
  }

  pub fn pair(&self) -> PairKey { PairKey::new(self.tenant_id, self.vehicle_id, self.type_id) }
}

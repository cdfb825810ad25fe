//! The (vehicle, maintenance type) pair — the unit of scheduling work.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one (tenant, vehicle, maintenance type) pair.
///
/// Alerts are unique per active pair, sweeps process pairs independently and
/// record completion is serialised against the sweep per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
  pub tenant_id:  Uuid,
  pub vehicle_id: Uuid,
  pub type_id:    Uuid,
}

impl PairKey {
  pub fn new(tenant_id: Uuid, vehicle_id: Uuid, type_id: Uuid) -> Self {
    Self { tenant_id, vehicle_id, type_id }
  }
}

impl fmt::Display for PairKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.tenant_id, self.vehicle_id, self.type_id)
  }
}

//! Vehicles as seen by the maintenance engine.
//!
//! Fleet management owns vehicles; the engine only reads the odometer and
//! operational status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleStatus {
  Active,
  InMaintenance,
  OutOfService,
  Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_id:  Uuid,
  pub tenant_id:   Uuid,
  pub plate:       String,
  /// Accumulated mileage; never decreases.
  pub odometer_km: i64,
  pub status:      VehicleStatus,
  pub created_at:  DateTime<Utc>,
}

impl Vehicle {
  pub fn new(tenant_id: Uuid, plate: impl Into<String>, odometer_km: i64) -> Self {
    Self {
      vehicle_id: Uuid::new_v4(),
      tenant_id,
      plate: plate.into(),
      odometer_km,
      status: VehicleStatus::Active,
      created_at: Utc::now(),
    }
  }

  pub fn is_active(&self) -> bool { self.status == VehicleStatus::Active }

  /// Advance the odometer to `km`. Equal readings are accepted.
  pub fn record_odometer(&mut self, km: i64) -> Result<()> {
    if km < self.odometer_km {
      return Err(Error::OdometerRegression {
        vehicle:  self.vehicle_id,
        current:  self.odometer_km,
        proposed: km,
      });
    }
    self.odometer_km = km;
    Ok(())
  }
}

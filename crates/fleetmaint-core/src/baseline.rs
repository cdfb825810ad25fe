//! Activation baselines of pairs without service history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PairKey;

/// Odometer reading and date at which a pair was first observed.
///
/// A pair that has never been serviced counts its first interval from here.
/// Written once, the first time a sweep sees the pair, and never moved
/// afterwards; a completed record supersedes it as the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairBaseline {
  pub tenant_id:   Uuid,
  pub vehicle_id:  Uuid,
  pub type_id:     Uuid,
  pub odometer_km: i64,
  pub observed_on: NaiveDate,
  pub created_at:  DateTime<Utc>,
}

impl PairBaseline {
  pub fn observe(pair: PairKey, odometer_km: i64, now: DateTime<Utc>) -> Self {
    Self {
      tenant_id: pair.tenant_id,
      vehicle_id: pair.vehicle_id,
      type_id: pair.type_id,
      odometer_km,
      observed_on: now.date_naive(),
      created_at: now,
    }
  }

  pub fn pair(&self) -> PairKey { PairKey::new(self.tenant_id, self.vehicle_id, self.type_id) }
}

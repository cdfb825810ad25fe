//! Maintenance types — named preventive (or corrective) policies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaintenanceClass {
  Preventive,
  Corrective,
}

/// Which axes a preventive policy is scheduled on.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntervalKind {
  Km,
  Months,
  Both,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaintenanceCategory {
  Engine,
  Brakes,
  Tires,
  Transmission,
  Electrical,
  Suspension,
  Filters,
  Inspection,
  Other,
}

/// How far ahead of the due point an alert starts warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertThresholds {
  pub before_km:   u32,
  pub before_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceType {
  pub type_id:                Uuid,
  pub tenant_id:              Uuid,
  pub name:                   String,
  pub category:               MaintenanceCategory,
  pub class:                  MaintenanceClass,
  pub interval_kind:          IntervalKind,
  pub default_km_interval:    Option<u32>,
  pub default_month_interval: Option<u32>,
  pub alert_before_km:        u32,
  pub alert_before_days:      u32,
  /// Mandatory types apply to every active vehicle without an explicit plan.
  pub mandatory:              bool,
  pub active:                 bool,
  pub created_at:             DateTime<Utc>,
}

impl MaintenanceType {
  /// A preventive type with sensible defaults; adjust fields as needed.
  pub fn preventive(
    tenant_id: Uuid,
    name: impl Into<String>,
    category: MaintenanceCategory,
    interval_kind: IntervalKind,
  ) -> Self {
    Self {
      type_id: Uuid::new_v4(),
      tenant_id,
      name: name.into(),
      category,
      class: MaintenanceClass::Preventive,
      interval_kind,
      default_km_interval: None,
      default_month_interval: None,
      alert_before_km: 1_000,
      alert_before_days: 15,
      mandatory: true,
      active: true,
      created_at: Utc::now(),
    }
  }

  pub fn thresholds(&self) -> AlertThresholds {
    AlertThresholds {
      before_km:   self.alert_before_km,
      before_days: self.alert_before_days,
    }
  }

  pub fn is_preventive(&self) -> bool { self.class == MaintenanceClass::Preventive }
}

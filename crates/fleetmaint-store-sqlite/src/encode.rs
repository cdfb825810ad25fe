//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that they sort lexically. Calendar dates are
//! `YYYY-MM-DD`. Enums are stored as their snake_case names. UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use fleetmaint_core::{
  alert::{AlertStatus, Dismisser, MaintenanceAlert},
  baseline::PairBaseline,
  maintenance_type::MaintenanceType,
  plan::VehicleMaintenancePlan,
  record::MaintenanceRecord,
  vehicle::Vehicle,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Domain enums derive `AsRefStr` with snake_case names.
pub fn encode_enum<T: AsRef<str>>(value: T) -> String { value.as_ref().to_owned() }

fn decode_enum<T: FromStr>(column: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    column,
    value: value.to_owned(),
  })
}

/// `(dismissed_by_kind, dismissed_by, dismissed_at)` column values.
pub fn encode_alert_status(status: &AlertStatus) -> (Option<String>, Option<String>, Option<String>) {
  match status {
    AlertStatus::Active => (None, None, None),
    AlertStatus::Dismissed { by: Dismisser::User(id), at } => {
      (Some("user".into()), Some(encode_uuid(*id)), Some(encode_dt(*at)))
    }
    AlertStatus::Dismissed { by: Dismisser::System, at } => {
      (Some("system".into()), None, Some(encode_dt(*at)))
    }
  }
}

fn decode_alert_status(
  kind: Option<String>,
  by: Option<String>,
  at: Option<String>,
) -> Result<AlertStatus> {
  let Some(kind) = kind else {
    return Ok(AlertStatus::Active);
  };
  let at = at
    .as_deref()
    .map(decode_dt)
    .transpose()?
    .ok_or_else(|| Error::DateParse("dismissed alert without dismissed_at".into()))?;
  let by = match (kind.as_str(), by) {
    ("system", _) => Dismisser::System,
    ("user", Some(id)) => Dismisser::User(decode_uuid(&id)?),
    (other, _) => {
      return Err(Error::UnknownVariant {
        column: "dismissed_by_kind",
        value:  other.to_owned(),
      });
    }
  };
  Ok(AlertStatus::Dismissed { by, at })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const VEHICLE_COLUMNS: &str = "vehicle_id, tenant_id, plate, odometer_km, status, created_at";

/// Raw values read directly from a `vehicles` row.
pub struct RawVehicle {
  pub vehicle_id:  String,
  pub tenant_id:   String,
  pub plate:       String,
  pub odometer_km: i64,
  pub status:      String,
  pub created_at:  String,
}

impl RawVehicle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vehicle_id:  row.get(0)?,
      tenant_id:   row.get(1)?,
      plate:       row.get(2)?,
      odometer_km: row.get(3)?,
      status:      row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_vehicle(self) -> Result<Vehicle> {
    Ok(Vehicle {
      vehicle_id:  decode_uuid(&self.vehicle_id)?,
      tenant_id:   decode_uuid(&self.tenant_id)?,
      plate:       self.plate,
      odometer_km: self.odometer_km,
      status:      decode_enum("vehicles.status", &self.status)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const TYPE_COLUMNS: &str = "type_id, tenant_id, name, category, class, interval_kind,
  default_km_interval, default_month_interval, alert_before_km, alert_before_days,
  mandatory, active, created_at";

/// Raw values read directly from a `maintenance_types` row.
pub struct RawMaintenanceType {
  pub type_id:                String,
  pub tenant_id:              String,
  pub name:                   String,
  pub category:               String,
  pub class:                  String,
  pub interval_kind:          String,
  pub default_km_interval:    Option<u32>,
  pub default_month_interval: Option<u32>,
  pub alert_before_km:        u32,
  pub alert_before_days:      u32,
  pub mandatory:              bool,
  pub active:                 bool,
  pub created_at:             String,
}

impl RawMaintenanceType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      type_id:                row.get(0)?,
      tenant_id:              row.get(1)?,
      name:                   row.get(2)?,
      category:               row.get(3)?,
      class:                  row.get(4)?,
      interval_kind:          row.get(5)?,
      default_km_interval:    row.get(6)?,
      default_month_interval: row.get(7)?,
      alert_before_km:        row.get(8)?,
      alert_before_days:      row.get(9)?,
      mandatory:              row.get(10)?,
      active:                 row.get(11)?,
      created_at:             row.get(12)?,
    })
  }

  pub fn into_maintenance_type(self) -> Result<MaintenanceType> {
    Ok(MaintenanceType {
      type_id:                decode_uuid(&self.type_id)?,
      tenant_id:              decode_uuid(&self.tenant_id)?,
      name:                   self.name,
      category:               decode_enum("maintenance_types.category", &self.category)?,
      class:                  decode_enum("maintenance_types.class", &self.class)?,
      interval_kind:          decode_enum("maintenance_types.interval_kind", &self.interval_kind)?,
      default_km_interval:    self.default_km_interval,
      default_month_interval: self.default_month_interval,
      alert_before_km:        self.alert_before_km,
      alert_before_days:      self.alert_before_days,
      mandatory:              self.mandatory,
      active:                 self.active,
      created_at:             decode_dt(&self.created_at)?,
    })
  }
}

pub const PLAN_COLUMNS: &str = "plan_id, tenant_id, vehicle_id, type_id, enabled,
  custom_km_interval, custom_month_interval, created_at";

/// Raw values read directly from a `vehicle_maintenance_plans` row.
pub struct RawPlan {
  pub plan_id:               String,
  pub tenant_id:             String,
  pub vehicle_id:            String,
  pub type_id:               String,
  pub enabled:               bool,
  pub custom_km_interval:    Option<u32>,
  pub custom_month_interval: Option<u32>,
  pub created_at:            String,
}

impl RawPlan {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      plan_id:               row.get(0)?,
      tenant_id:             row.get(1)?,
      vehicle_id:            row.get(2)?,
      type_id:               row.get(3)?,
      enabled:               row.get(4)?,
      custom_km_interval:    row.get(5)?,
      custom_month_interval: row.get(6)?,
      created_at:            row.get(7)?,
    })
  }

  pub fn into_plan(self) -> Result<VehicleMaintenancePlan> {
    Ok(VehicleMaintenancePlan {
      plan_id:               decode_uuid(&self.plan_id)?,
      tenant_id:             decode_uuid(&self.tenant_id)?,
      vehicle_id:            decode_uuid(&self.vehicle_id)?,
      type_id:               decode_uuid(&self.type_id)?,
      enabled:               self.enabled,
      custom_km_interval:    self.custom_km_interval,
      custom_month_interval: self.custom_month_interval,
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

pub const RECORD_COLUMNS: &str = "record_id, tenant_id, vehicle_id, type_id, class, status,
  scheduled_date, executed_date, vehicle_km_at_maintenance, next_maintenance_km,
  next_maintenance_date, notes, cost_cents, created_at, updated_at, version";

/// Raw values read directly from a `maintenance_records` row.
pub struct RawRecord {
  pub record_id:                 String,
  pub tenant_id:                 String,
  pub vehicle_id:                String,
  pub type_id:                   Option<String>,
  pub class:                     String,
  pub status:                    String,
  pub scheduled_date:            Option<String>,
  pub executed_date:             Option<String>,
  pub vehicle_km_at_maintenance: Option<i64>,
  pub next_maintenance_km:       Option<i64>,
  pub next_maintenance_date:     Option<String>,
  pub notes:                     Option<String>,
  pub cost_cents:                Option<i64>,
  pub created_at:                String,
  pub updated_at:                String,
  pub version:                   i64,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:                 row.get(0)?,
      tenant_id:                 row.get(1)?,
      vehicle_id:                row.get(2)?,
      type_id:                   row.get(3)?,
      class:                     row.get(4)?,
      status:                    row.get(5)?,
      scheduled_date:            row.get(6)?,
      executed_date:             row.get(7)?,
      vehicle_km_at_maintenance: row.get(8)?,
      next_maintenance_km:       row.get(9)?,
      next_maintenance_date:     row.get(10)?,
      notes:                     row.get(11)?,
      cost_cents:                row.get(12)?,
      created_at:                row.get(13)?,
      updated_at:                row.get(14)?,
      version:                   row.get(15)?,
    })
  }

  pub fn into_record(self) -> Result<MaintenanceRecord> {
    Ok(MaintenanceRecord {
      record_id:                 decode_uuid(&self.record_id)?,
      tenant_id:                 decode_uuid(&self.tenant_id)?,
      vehicle_id:                decode_uuid(&self.vehicle_id)?,
      type_id:                   self.type_id.as_deref().map(decode_uuid).transpose()?,
      class:                     decode_enum("maintenance_records.class", &self.class)?,
      status:                    decode_enum("maintenance_records.status", &self.status)?,
      scheduled_date:            decode_opt_date(self.scheduled_date)?,
      executed_date:             decode_opt_date(self.executed_date)?,
      vehicle_km_at_maintenance: self.vehicle_km_at_maintenance,
      next_maintenance_km:       self.next_maintenance_km,
      next_maintenance_date:     decode_opt_date(self.next_maintenance_date)?,
      notes:                     self.notes,
      cost_cents:                self.cost_cents,
      created_at:                decode_dt(&self.created_at)?,
      updated_at:                decode_dt(&self.updated_at)?,
      version:                   self.version,
    })
  }
}

pub const BASELINE_COLUMNS: &str =
  "tenant_id, vehicle_id, type_id, odometer_km, observed_on, created_at";

/// Raw values read directly from a `pair_baselines` row.
pub struct RawBaseline {
  pub tenant_id:   String,
  pub vehicle_id:  String,
  pub type_id:     String,
  pub odometer_km: i64,
  pub observed_on: String,
  pub created_at:  String,
}

impl RawBaseline {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tenant_id:   row.get(0)?,
      vehicle_id:  row.get(1)?,
      type_id:     row.get(2)?,
      odometer_km: row.get(3)?,
      observed_on: row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_baseline(self) -> Result<PairBaseline> {
    Ok(PairBaseline {
      tenant_id:   decode_uuid(&self.tenant_id)?,
      vehicle_id:  decode_uuid(&self.vehicle_id)?,
      type_id:     decode_uuid(&self.type_id)?,
      odometer_km: self.odometer_km,
      observed_on: decode_date(&self.observed_on)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const ALERT_COLUMNS: &str = "alert_id, tenant_id, vehicle_id, type_id, alert_type, severity,
  due_km, due_date, km_remaining, days_remaining, dismissed_by_kind, dismissed_by,
  dismissed_at, created_at, updated_at, version";

/// Raw values read directly from a `maintenance_alerts` row.
pub struct RawAlert {
  pub alert_id:          String,
  pub tenant_id:         String,
  pub vehicle_id:        String,
  pub type_id:           String,
  pub alert_type:        String,
  pub severity:          String,
  pub due_km:            Option<i64>,
  pub due_date:          Option<String>,
  pub km_remaining:      Option<i64>,
  pub days_remaining:    Option<i64>,
  pub dismissed_by_kind: Option<String>,
  pub dismissed_by:      Option<String>,
  pub dismissed_at:      Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
  pub version:           i64,
}

impl RawAlert {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alert_id:          row.get(0)?,
      tenant_id:         row.get(1)?,
      vehicle_id:        row.get(2)?,
      type_id:           row.get(3)?,
      alert_type:        row.get(4)?,
      severity:          row.get(5)?,
      due_km:            row.get(6)?,
      due_date:          row.get(7)?,
      km_remaining:      row.get(8)?,
      days_remaining:    row.get(9)?,
      dismissed_by_kind: row.get(10)?,
      dismissed_by:      row.get(11)?,
      dismissed_at:      row.get(12)?,
      created_at:        row.get(13)?,
      updated_at:        row.get(14)?,
      version:           row.get(15)?,
    })
  }

  pub fn into_alert(self) -> Result<MaintenanceAlert> {
    Ok(MaintenanceAlert {
      alert_id:       decode_uuid(&self.alert_id)?,
      tenant_id:      decode_uuid(&self.tenant_id)?,
      vehicle_id:     decode_uuid(&self.vehicle_id)?,
      type_id:        decode_uuid(&self.type_id)?,
      alert_type:     decode_enum("maintenance_alerts.alert_type", &self.alert_type)?,
      severity:       decode_enum("maintenance_alerts.severity", &self.severity)?,
      due_km:         self.due_km,
      due_date:       decode_opt_date(self.due_date)?,
      km_remaining:   self.km_remaining,
      days_remaining: self.days_remaining,
      status:         decode_alert_status(self.dismissed_by_kind, self.dismissed_by, self.dismissed_at)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
      version:        self.version,
    })
  }
}

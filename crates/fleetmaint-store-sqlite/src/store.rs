//! [`SqliteStore`]: the SQLite implementation of [`MaintenanceStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use fleetmaint_core::{
  PairKey,
  alert::MaintenanceAlert,
  baseline::PairBaseline,
  maintenance_type::{MaintenanceClass, MaintenanceType},
  plan::VehicleMaintenancePlan,
  record::{MaintenanceRecord, RecordStatus},
  store::MaintenanceStore,
  vehicle::{Vehicle, VehicleStatus},
};

use crate::{
  Error, Result,
  encode::{
    ALERT_COLUMNS, BASELINE_COLUMNS, PLAN_COLUMNS, RECORD_COLUMNS, RawAlert, RawBaseline,
    RawMaintenanceType, RawPlan, RawRecord, RawVehicle, TYPE_COLUMNS, VEHICLE_COLUMNS,
    encode_alert_status, encode_date, encode_dt, encode_enum, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A maintenance store backed by a single SQLite file.
///
/// Clones share one connection. Calls run one after another on its thread,
/// so each `call` closure is atomic with respect to other store operations.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_records(&self, sql: String, pair: PairKey) -> Result<Vec<MaintenanceRecord>> {
    let tenant_str  = encode_uuid(pair.tenant_id);
    let vehicle_str = encode_uuid(pair.vehicle_id);
    let type_str    = encode_uuid(pair.type_id);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![tenant_str, vehicle_str, type_str],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn query_pair_alert(&self, sql: String, pair: PairKey) -> Result<Option<MaintenanceAlert>> {
    let tenant_str  = encode_uuid(pair.tenant_id);
    let vehicle_str = encode_uuid(pair.vehicle_id);
    let type_str    = encode_uuid(pair.type_id);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![tenant_str, vehicle_str, type_str],
              RawAlert::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }
}

// ─── Encoded writes ──────────────────────────────────────────────────────────

/// Owned column values of a record, ready to move into a `call` closure.
struct EncodedRecord {
  record_id:      String,
  tenant_id:      String,
  vehicle_id:     String,
  type_id:        Option<String>,
  class:          String,
  status:         String,
  scheduled_date: Option<String>,
  executed_date:  Option<String>,
  km_at:          Option<i64>,
  next_km:        Option<i64>,
  next_date:      Option<String>,
  notes:          Option<String>,
  cost_cents:     Option<i64>,
  created_at:     String,
  updated_at:     String,
  version:        i64,
}

impl EncodedRecord {
  fn new(r: MaintenanceRecord) -> Self {
    Self {
      record_id:      encode_uuid(r.record_id),
      tenant_id:      encode_uuid(r.tenant_id),
      vehicle_id:     encode_uuid(r.vehicle_id),
      type_id:        r.type_id.map(encode_uuid),
      class:          encode_enum(r.class),
      status:         encode_enum(r.status),
      scheduled_date: r.scheduled_date.map(encode_date),
      executed_date:  r.executed_date.map(encode_date),
      km_at:          r.vehicle_km_at_maintenance,
      next_km:        r.next_maintenance_km,
      next_date:      r.next_maintenance_date.map(encode_date),
      notes:          r.notes,
      cost_cents:     r.cost_cents,
      created_at:     encode_dt(r.created_at),
      updated_at:     encode_dt(r.updated_at),
      version:        r.version,
    }
  }
}

/// Owned column values of an alert, ready to move into a `call` closure.
struct EncodedAlert {
  alert_id:       String,
  tenant_id:      String,
  vehicle_id:     String,
  type_id:        String,
  alert_type:     String,
  severity:       String,
  due_km:         Option<i64>,
  due_date:       Option<String>,
  km_remaining:   Option<i64>,
  days_remaining: Option<i64>,
  dismissed_kind: Option<String>,
  dismissed_by:   Option<String>,
  dismissed_at:   Option<String>,
  created_at:     String,
  updated_at:     String,
  version:        i64,
}

impl EncodedAlert {
  fn new(a: MaintenanceAlert) -> Self {
    let (dismissed_kind, dismissed_by, dismissed_at) = encode_alert_status(&a.status);
    Self {
      alert_id: encode_uuid(a.alert_id),
      tenant_id: encode_uuid(a.tenant_id),
      vehicle_id: encode_uuid(a.vehicle_id),
      type_id: encode_uuid(a.type_id),
      alert_type: encode_enum(a.alert_type),
      severity: encode_enum(a.severity),
      due_km: a.due_km,
      due_date: a.due_date.map(encode_date),
      km_remaining: a.km_remaining,
      days_remaining: a.days_remaining,
      dismissed_kind,
      dismissed_by,
      dismissed_at,
      created_at: encode_dt(a.created_at),
      updated_at: encode_dt(a.updated_at),
      version: a.version,
    }
  }
}

// ─── MaintenanceStore impl ───────────────────────────────────────────────────

impl MaintenanceStore for SqliteStore {
  type Error = Error;

  // ── Vehicles ──────────────────────────────────────────────────────────────

  async fn put_vehicle(&self, vehicle: Vehicle) -> Result<()> {
    let id_str      = encode_uuid(vehicle.vehicle_id);
    let tenant_str  = encode_uuid(vehicle.tenant_id);
    let status_str  = encode_enum(vehicle.status);
    let created_str = encode_dt(vehicle.created_at);
    let plate       = vehicle.plate;
    let odometer    = vehicle.odometer_km;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO vehicles (vehicle_id, tenant_id, plate, odometer_km, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (vehicle_id) DO UPDATE SET
             plate = excluded.plate,
             odometer_km = excluded.odometer_km,
             status = excluded.status",
          rusqlite::params![id_str, tenant_str, plate, odometer, status_str, created_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_vehicle(&self, tenant_id: Uuid, vehicle_id: Uuid) -> Result<Option<Vehicle>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(vehicle_id);

    let raw: Option<RawVehicle> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE tenant_id = ?1 AND vehicle_id = ?2"),
              rusqlite::params![tenant_str, id_str],
              RawVehicle::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVehicle::into_vehicle).transpose()
  }

  async fn list_active_vehicles(&self, tenant_id: Uuid) -> Result<Vec<Vehicle>> {
    let tenant_str = encode_uuid(tenant_id);
    let status_str = encode_enum(VehicleStatus::Active);

    let raws: Vec<RawVehicle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VEHICLE_COLUMNS} FROM vehicles
           WHERE tenant_id = ?1 AND status = ?2
           ORDER BY plate"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str, status_str], RawVehicle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVehicle::into_vehicle).collect()
  }

  async fn update_odometer(&self, tenant_id: Uuid, vehicle_id: Uuid, odometer_km: i64) -> Result<Vehicle> {
    let mut vehicle = self
      .get_vehicle(tenant_id, vehicle_id)
      .await?
      .ok_or(fleetmaint_core::Error::NotFound { kind: "vehicle", id: vehicle_id })?;
    vehicle.record_odometer(odometer_km)?;

    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(vehicle_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE vehicles SET odometer_km = ?3
           WHERE tenant_id = ?1 AND vehicle_id = ?2 AND odometer_km <= ?3",
          rusqlite::params![tenant_str, id_str, odometer_km],
        )?)
      })
      .await?;

    if changed == 0 {
      // A higher reading landed between our read and the write.
      let current = self
        .get_vehicle(tenant_id, vehicle_id)
        .await?
        .map_or(odometer_km, |v| v.odometer_km);
      return Err(
        fleetmaint_core::Error::OdometerRegression {
          vehicle:  vehicle_id,
          current,
          proposed: odometer_km,
        }
        .into(),
      );
    }

    Ok(vehicle)
  }

  // ── Maintenance types ─────────────────────────────────────────────────────

  async fn put_maintenance_type(&self, t: MaintenanceType) -> Result<()> {
    let id_str       = encode_uuid(t.type_id);
    let tenant_str   = encode_uuid(t.tenant_id);
    let category_str = encode_enum(t.category);
    let class_str    = encode_enum(t.class);
    let kind_str     = encode_enum(t.interval_kind);
    let created_str  = encode_dt(t.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO maintenance_types (
             type_id, tenant_id, name, category, class, interval_kind,
             default_km_interval, default_month_interval,
             alert_before_km, alert_before_days, mandatory, active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
           ON CONFLICT (type_id) DO UPDATE SET
             name = excluded.name,
             category = excluded.category,
             class = excluded.class,
             interval_kind = excluded.interval_kind,
             default_km_interval = excluded.default_km_interval,
             default_month_interval = excluded.default_month_interval,
             alert_before_km = excluded.alert_before_km,
             alert_before_days = excluded.alert_before_days,
             mandatory = excluded.mandatory,
             active = excluded.active",
          rusqlite::params![
            id_str,
            tenant_str,
            t.name,
            category_str,
            class_str,
            kind_str,
            t.default_km_interval,
            t.default_month_interval,
            t.alert_before_km,
            t.alert_before_days,
            t.mandatory,
            t.active,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_maintenance_type(&self, tenant_id: Uuid, type_id: Uuid) -> Result<Option<MaintenanceType>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(type_id);

    let raw: Option<RawMaintenanceType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TYPE_COLUMNS} FROM maintenance_types WHERE tenant_id = ?1 AND type_id = ?2"),
              rusqlite::params![tenant_str, id_str],
              RawMaintenanceType::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMaintenanceType::into_maintenance_type).transpose()
  }

  async fn list_active_preventive_types(&self, tenant_id: Uuid) -> Result<Vec<MaintenanceType>> {
    let tenant_str = encode_uuid(tenant_id);
    let class_str  = encode_enum(MaintenanceClass::Preventive);

    let raws: Vec<RawMaintenanceType> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TYPE_COLUMNS} FROM maintenance_types
           WHERE tenant_id = ?1 AND class = ?2 AND active = 1
           ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str, class_str], RawMaintenanceType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMaintenanceType::into_maintenance_type).collect()
  }

  // ── Plans ─────────────────────────────────────────────────────────────────

  async fn add_plan(&self, plan: VehicleMaintenancePlan) -> Result<VehicleMaintenancePlan> {
    let id_str      = encode_uuid(plan.plan_id);
    let tenant_str  = encode_uuid(plan.tenant_id);
    let vehicle_str = encode_uuid(plan.vehicle_id);
    let type_str    = encode_uuid(plan.type_id);
    let created_str = encode_dt(plan.created_at);
    let enabled     = plan.enabled;
    let custom_km   = plan.custom_km_interval;
    let custom_mo   = plan.custom_month_interval;

    let inserted = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM vehicle_maintenance_plans
             WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3",
            rusqlite::params![tenant_str, vehicle_str, type_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO vehicle_maintenance_plans (
             plan_id, tenant_id, vehicle_id, type_id, enabled,
             custom_km_interval, custom_month_interval, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            tenant_str,
            vehicle_str,
            type_str,
            enabled,
            custom_km,
            custom_mo,
            created_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(
        fleetmaint_core::Error::DuplicatePlan {
          vehicle:          plan.vehicle_id,
          maintenance_type: plan.type_id,
        }
        .into(),
      );
    }

    Ok(plan)
  }

  async fn update_plan(&self, plan: VehicleMaintenancePlan) -> Result<()> {
    let id_str     = encode_uuid(plan.plan_id);
    let tenant_str = encode_uuid(plan.tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE vehicle_maintenance_plans
           SET enabled = ?3, custom_km_interval = ?4, custom_month_interval = ?5
           WHERE tenant_id = ?1 AND plan_id = ?2",
          rusqlite::params![
            tenant_str,
            id_str,
            plan.enabled,
            plan.custom_km_interval,
            plan.custom_month_interval,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(fleetmaint_core::Error::NotFound { kind: "plan", id: plan.plan_id }.into());
    }
    Ok(())
  }

  async fn delete_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> Result<bool> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(plan_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM vehicle_maintenance_plans WHERE tenant_id = ?1 AND plan_id = ?2",
          rusqlite::params![tenant_str, id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn get_plan(&self, pair: PairKey) -> Result<Option<VehicleMaintenancePlan>> {
    let tenant_str  = encode_uuid(pair.tenant_id);
    let vehicle_str = encode_uuid(pair.vehicle_id);
    let type_str    = encode_uuid(pair.type_id);

    let raw: Option<RawPlan> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PLAN_COLUMNS} FROM vehicle_maintenance_plans
                 WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3"
              ),
              rusqlite::params![tenant_str, vehicle_str, type_str],
              RawPlan::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlan::into_plan).transpose()
  }

  async fn list_plans(&self, tenant_id: Uuid) -> Result<Vec<VehicleMaintenancePlan>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawPlan> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAN_COLUMNS} FROM vehicle_maintenance_plans WHERE tenant_id = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], RawPlan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlan::into_plan).collect()
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn insert_record(&self, record: MaintenanceRecord) -> Result<()> {
    let r = EncodedRecord::new(record);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO maintenance_records ({RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            r.record_id,
            r.tenant_id,
            r.vehicle_id,
            r.type_id,
            r.class,
            r.status,
            r.scheduled_date,
            r.executed_date,
            r.km_at,
            r.next_km,
            r.next_date,
            r.notes,
            r.cost_cents,
            r.created_at,
            r.updated_at,
            r.version,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_record(&self, tenant_id: Uuid, record_id: Uuid) -> Result<Option<MaintenanceRecord>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(record_id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RECORD_COLUMNS} FROM maintenance_records
                 WHERE tenant_id = ?1 AND record_id = ?2"
              ),
              rusqlite::params![tenant_str, id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn update_record(&self, record: MaintenanceRecord, expected_version: i64) -> Result<bool> {
    let r = EncodedRecord::new(record);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE maintenance_records SET
             status = ?3, scheduled_date = ?4, executed_date = ?5,
             vehicle_km_at_maintenance = ?6, next_maintenance_km = ?7,
             next_maintenance_date = ?8, notes = ?9, cost_cents = ?10,
             updated_at = ?11, version = ?12
           WHERE tenant_id = ?1 AND record_id = ?2 AND version = ?13",
          rusqlite::params![
            r.tenant_id,
            r.record_id,
            r.status,
            r.scheduled_date,
            r.executed_date,
            r.km_at,
            r.next_km,
            r.next_date,
            r.notes,
            r.cost_cents,
            r.updated_at,
            r.version,
            expected_version,
          ],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn last_completed_record(&self, pair: PairKey) -> Result<Option<MaintenanceRecord>> {
    let status_str = encode_enum(RecordStatus::Completed);
    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM maintenance_records
       WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3 AND status = '{status_str}'
       ORDER BY executed_date DESC, vehicle_km_at_maintenance DESC, updated_at DESC
       LIMIT 1"
    );
    Ok(self.query_records(sql, pair).await?.into_iter().next())
  }

  async fn open_records(&self, pair: PairKey) -> Result<Vec<MaintenanceRecord>> {
    let scheduled = encode_enum(RecordStatus::Scheduled);
    let overdue   = encode_enum(RecordStatus::Overdue);
    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM maintenance_records
       WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3
         AND status IN ('{scheduled}', '{overdue}')
       ORDER BY scheduled_date, created_at"
    );
    self.query_records(sql, pair).await
  }

  // ── Baselines ─────────────────────────────────────────────────────────────

  async fn pair_baseline(&self, pair: PairKey) -> Result<Option<PairBaseline>> {
    let tenant_str  = encode_uuid(pair.tenant_id);
    let vehicle_str = encode_uuid(pair.vehicle_id);
    let type_str    = encode_uuid(pair.type_id);

    let raw: Option<RawBaseline> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {BASELINE_COLUMNS} FROM pair_baselines
                 WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3"
              ),
              rusqlite::params![tenant_str, vehicle_str, type_str],
              RawBaseline::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBaseline::into_baseline).transpose()
  }

  async fn ensure_pair_baseline(&self, baseline: PairBaseline) -> Result<PairBaseline> {
    let tenant_str   = encode_uuid(baseline.tenant_id);
    let vehicle_str  = encode_uuid(baseline.vehicle_id);
    let type_str     = encode_uuid(baseline.type_id);
    let observed_str = encode_date(baseline.observed_on);
    let created_str  = encode_dt(baseline.created_at);
    let odometer_km  = baseline.odometer_km;

    let raw: RawBaseline = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO pair_baselines
             (tenant_id, vehicle_id, type_id, odometer_km, observed_on, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (tenant_id, vehicle_id, type_id) DO NOTHING",
          rusqlite::params![tenant_str, vehicle_str, type_str, odometer_km, observed_str, created_str],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {BASELINE_COLUMNS} FROM pair_baselines
             WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3"
          ),
          rusqlite::params![tenant_str, vehicle_str, type_str],
          RawBaseline::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_baseline()
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn insert_alert(&self, alert: MaintenanceAlert) -> Result<()> {
    let a = EncodedAlert::new(alert);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO maintenance_alerts ({ALERT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            a.alert_id,
            a.tenant_id,
            a.vehicle_id,
            a.type_id,
            a.alert_type,
            a.severity,
            a.due_km,
            a.due_date,
            a.km_remaining,
            a.days_remaining,
            a.dismissed_kind,
            a.dismissed_by,
            a.dismissed_at,
            a.created_at,
            a.updated_at,
            a.version,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_alert(&self, tenant_id: Uuid, alert_id: Uuid) -> Result<Option<MaintenanceAlert>> {
    let tenant_str = encode_uuid(tenant_id);
    let id_str     = encode_uuid(alert_id);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ALERT_COLUMNS} FROM maintenance_alerts
                 WHERE tenant_id = ?1 AND alert_id = ?2"
              ),
              rusqlite::params![tenant_str, id_str],
              RawAlert::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn update_alert(&self, alert: MaintenanceAlert, expected_version: i64) -> Result<bool> {
    let a = EncodedAlert::new(alert);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE maintenance_alerts SET
             alert_type = ?3, severity = ?4, due_km = ?5, due_date = ?6,
             km_remaining = ?7, days_remaining = ?8,
             dismissed_by_kind = ?9, dismissed_by = ?10, dismissed_at = ?11,
             updated_at = ?12, version = ?13
           WHERE tenant_id = ?1 AND alert_id = ?2 AND version = ?14",
          rusqlite::params![
            a.tenant_id,
            a.alert_id,
            a.alert_type,
            a.severity,
            a.due_km,
            a.due_date,
            a.km_remaining,
            a.days_remaining,
            a.dismissed_kind,
            a.dismissed_by,
            a.dismissed_at,
            a.updated_at,
            a.version,
            expected_version,
          ],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn active_alert(&self, pair: PairKey) -> Result<Option<MaintenanceAlert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM maintenance_alerts
       WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3
         AND dismissed_by_kind IS NULL
       ORDER BY created_at DESC
       LIMIT 1"
    );
    self.query_pair_alert(sql, pair).await
  }

  async fn latest_dismissed_alert(&self, pair: PairKey) -> Result<Option<MaintenanceAlert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM maintenance_alerts
       WHERE tenant_id = ?1 AND vehicle_id = ?2 AND type_id = ?3
         AND dismissed_by_kind IS NOT NULL
       ORDER BY dismissed_at DESC, created_at DESC
       LIMIT 1"
    );
    self.query_pair_alert(sql, pair).await
  }

  async fn list_active_alerts(&self, tenant_id: Uuid) -> Result<Vec<MaintenanceAlert>> {
    let tenant_str = encode_uuid(tenant_id);

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ALERT_COLUMNS} FROM maintenance_alerts
           WHERE tenant_id = ?1 AND dismissed_by_kind IS NULL
           ORDER BY CASE severity
                      WHEN 'critical' THEN 0
                      WHEN 'warning'  THEN 1
                      ELSE 2
                    END,
                    created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }
}

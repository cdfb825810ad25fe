//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use fleetmaint_core::{
  Error as CoreError, PairKey,
  alert::{AlertStatus, Dismisser, MaintenanceAlert, dismiss},
  baseline::PairBaseline,
  due::DueStatus,
  maintenance_type::{IntervalKind, MaintenanceCategory, MaintenanceClass, MaintenanceType},
  plan::VehicleMaintenancePlan,
  record::{MaintenanceRecord, RecordStatus},
  severity::{AlertCandidate, AlertType, Axis, Severity},
  store::MaintenanceStore,
  vehicle::{Vehicle, VehicleStatus},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

/// A store seeded with one vehicle and one km-based type.
async fn seeded() -> (SqliteStore, PairKey) {
  let s = store().await;
  let tenant = Uuid::new_v4();

  let vehicle = Vehicle::new(tenant, "BCDF-12", 45_000);
  let mut oil = MaintenanceType::preventive(tenant, "Oil change", MaintenanceCategory::Engine, IntervalKind::Km);
  oil.default_km_interval = Some(10_000);

  let pair = PairKey::new(tenant, vehicle.vehicle_id, oil.type_id);
  s.put_vehicle(vehicle).await.unwrap();
  s.put_maintenance_type(oil).await.unwrap();
  (s, pair)
}

fn warning(pair: PairKey) -> MaintenanceAlert {
  let candidate = AlertCandidate {
    alert_type: AlertType::Km,
    severity:   Severity::Warning,
    axis:       Axis::Km,
    remaining:  700,
    due:        DueStatus {
      due_km: Some(55_000),
      km_remaining: Some(700),
      ..DueStatus::default()
    },
  };
  MaintenanceAlert::from_candidate(pair, &candidate, Utc::now())
}

// ─── Vehicles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_vehicle() {
  let (s, pair) = seeded().await;

  let v = s.get_vehicle(pair.tenant_id, pair.vehicle_id).await.unwrap().unwrap();
  assert_eq!(v.odometer_km, 45_000);
  assert_eq!(v.plate, "BCDF-12");
  assert_eq!(v.status, VehicleStatus::Active);
}

#[tokio::test]
async fn vehicles_are_tenant_scoped() {
  let (s, pair) = seeded().await;
  let other_tenant = Uuid::new_v4();

  assert!(s.get_vehicle(other_tenant, pair.vehicle_id).await.unwrap().is_none());
  assert!(s.list_active_vehicles(other_tenant).await.unwrap().is_empty());
  assert_eq!(s.list_active_vehicles(pair.tenant_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn retired_vehicles_are_not_listed() {
  let (s, pair) = seeded().await;
  let mut retired = Vehicle::new(pair.tenant_id, "ZZZZ-99", 300_000);
  retired.status = VehicleStatus::Retired;
  s.put_vehicle(retired).await.unwrap();

  let active = s.list_active_vehicles(pair.tenant_id).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].vehicle_id, pair.vehicle_id);
}

#[tokio::test]
async fn odometer_is_monotonic() {
  let (s, pair) = seeded().await;

  let v = s.update_odometer(pair.tenant_id, pair.vehicle_id, 47_500).await.unwrap();
  assert_eq!(v.odometer_km, 47_500);

  let err = s
    .update_odometer(pair.tenant_id, pair.vehicle_id, 47_000)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::OdometerRegression { current: 47_500, .. })));

  let v = s.get_vehicle(pair.tenant_id, pair.vehicle_id).await.unwrap().unwrap();
  assert_eq!(v.odometer_km, 47_500);
}

// ─── Maintenance types ───────────────────────────────────────────────────────

#[tokio::test]
async fn maintenance_type_roundtrip() {
  let (s, pair) = seeded().await;

  let t = s.get_maintenance_type(pair.tenant_id, pair.type_id).await.unwrap().unwrap();
  assert_eq!(t.name, "Oil change");
  assert_eq!(t.interval_kind, IntervalKind::Km);
  assert_eq!(t.category, MaintenanceCategory::Engine);
  assert_eq!(t.default_km_interval, Some(10_000));
  assert_eq!(t.default_month_interval, None);
  assert!(t.mandatory);
}

#[tokio::test]
async fn only_active_preventive_types_are_listed() {
  let (s, pair) = seeded().await;

  let mut repair = MaintenanceType::preventive(pair.tenant_id, "Body repair", MaintenanceCategory::Other, IntervalKind::Km);
  repair.class = MaintenanceClass::Corrective;
  let mut retired = MaintenanceType::preventive(pair.tenant_id, "Old check", MaintenanceCategory::Inspection, IntervalKind::Months);
  retired.active = false;
  s.put_maintenance_type(repair).await.unwrap();
  s.put_maintenance_type(retired).await.unwrap();

  let types = s.list_active_preventive_types(pair.tenant_id).await.unwrap();
  assert_eq!(types.len(), 1);
  assert_eq!(types[0].type_id, pair.type_id);
}

// ─── Plans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_plan_for_a_pair_is_rejected() {
  let (s, pair) = seeded().await;

  let mut plan = VehicleMaintenancePlan::new(pair);
  plan.custom_km_interval = Some(5_000);
  s.add_plan(plan).await.unwrap();

  let err = s.add_plan(VehicleMaintenancePlan::new(pair)).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicatePlan { .. })));

  let stored = s.get_plan(pair).await.unwrap().unwrap();
  assert_eq!(stored.custom_km_interval, Some(5_000));
}

#[tokio::test]
async fn update_and_delete_plan() {
  let (s, pair) = seeded().await;
  let mut plan = s.add_plan(VehicleMaintenancePlan::new(pair)).await.unwrap();

  plan.enabled = false;
  plan.custom_month_interval = Some(3);
  s.update_plan(plan.clone()).await.unwrap();

  let stored = s.get_plan(pair).await.unwrap().unwrap();
  assert!(!stored.enabled);
  assert_eq!(stored.custom_month_interval, Some(3));
  assert_eq!(s.list_plans(pair.tenant_id).await.unwrap().len(), 1);

  assert!(s.delete_plan(pair.tenant_id, plan.plan_id).await.unwrap());
  assert!(!s.delete_plan(pair.tenant_id, plan.plan_id).await.unwrap());
  assert!(s.get_plan(pair).await.unwrap().is_none());
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_roundtrip() {
  let (s, pair) = seeded().await;

  let mut r = MaintenanceRecord::schedule(pair, Some(date(2025, 6, 1)));
  r.notes = Some("depot 3".into());
  r.cost_cents = Some(12_500);
  s.insert_record(r.clone()).await.unwrap();

  let got = s.get_record(pair.tenant_id, r.record_id).await.unwrap().unwrap();
  assert_eq!(got.status, RecordStatus::Scheduled);
  assert_eq!(got.scheduled_date, Some(date(2025, 6, 1)));
  assert_eq!(got.type_id, Some(pair.type_id));
  assert_eq!(got.notes.as_deref(), Some("depot 3"));
  assert_eq!(got.cost_cents, Some(12_500));
  assert_eq!(got.version, 1);

  assert!(s.get_record(Uuid::new_v4(), r.record_id).await.unwrap().is_none());
}

#[tokio::test]
async fn record_update_checks_version() {
  let (s, pair) = seeded().await;
  let r = MaintenanceRecord::schedule(pair, None);
  s.insert_record(r.clone()).await.unwrap();

  let mut next = r.clone();
  next.status = RecordStatus::Overdue;
  next.version = 2;
  assert!(s.update_record(next.clone(), 1).await.unwrap());

  // Stale writer still believes the row is at version 1.
  let mut stale = r.clone();
  stale.status = RecordStatus::Cancelled;
  stale.version = 2;
  assert!(!s.update_record(stale, 1).await.unwrap());

  let got = s.get_record(pair.tenant_id, r.record_id).await.unwrap().unwrap();
  assert_eq!(got.status, RecordStatus::Overdue);
  assert_eq!(got.version, 2);
}

#[tokio::test]
async fn last_completed_is_the_latest_execution() {
  let (s, pair) = seeded().await;

  for (executed, km) in [(date(2024, 1, 10), 20_000), (date(2025, 2, 3), 35_000), (date(2024, 8, 1), 28_000)] {
    let mut r = MaintenanceRecord::schedule(pair, None);
    r.status = RecordStatus::Completed;
    r.executed_date = Some(executed);
    r.vehicle_km_at_maintenance = Some(km);
    s.insert_record(r).await.unwrap();
  }
  s.insert_record(MaintenanceRecord::schedule(pair, Some(date(2025, 9, 1))))
    .await
    .unwrap();

  let last = s.last_completed_record(pair).await.unwrap().unwrap();
  assert_eq!(last.executed_date, Some(date(2025, 2, 3)));
  assert_eq!(last.vehicle_km_at_maintenance, Some(35_000));

  let open = s.open_records(pair).await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].status, RecordStatus::Scheduled);
}

// ─── Baselines ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_baseline_wins() {
  let (s, pair) = seeded().await;
  assert!(s.pair_baseline(pair).await.unwrap().is_none());

  let first = PairBaseline::observe(pair, 45_000, date(2025, 1, 15).and_hms_opt(6, 0, 0).unwrap().and_utc());
  let stored = s.ensure_pair_baseline(first).await.unwrap();
  assert_eq!(stored, first);

  let later = PairBaseline::observe(pair, 52_000, date(2025, 4, 1).and_hms_opt(6, 0, 0).unwrap().and_utc());
  let stored = s.ensure_pair_baseline(later).await.unwrap();
  assert_eq!(stored.odometer_km, 45_000);
  assert_eq!(stored.observed_on, date(2025, 1, 15));

  assert_eq!(s.pair_baseline(pair).await.unwrap(), Some(first));
  let other_tenant = PairKey::new(Uuid::new_v4(), pair.vehicle_id, pair.type_id);
  assert!(s.pair_baseline(other_tenant).await.unwrap().is_none());
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alert_roundtrip_and_active_lookup() {
  let (s, pair) = seeded().await;
  let alert = warning(pair);
  s.insert_alert(alert.clone()).await.unwrap();

  let active = s.active_alert(pair).await.unwrap().unwrap();
  assert_eq!(active.alert_id, alert.alert_id);
  assert_eq!(active.severity, Severity::Warning);
  assert_eq!(active.km_remaining, Some(700));
  assert_eq!(active.status, AlertStatus::Active);
  assert!(s.latest_dismissed_alert(pair).await.unwrap().is_none());
}

#[tokio::test]
async fn dismissed_alert_moves_out_of_active() {
  let (s, pair) = seeded().await;
  let alert = warning(pair);
  s.insert_alert(alert.clone()).await.unwrap();

  let by = Dismisser::User(Uuid::new_v4());
  let dismissed = dismiss(&alert, by, Utc::now()).unwrap();
  assert!(s.update_alert(dismissed, alert.version).await.unwrap());

  assert!(s.active_alert(pair).await.unwrap().is_none());
  assert!(s.list_active_alerts(pair.tenant_id).await.unwrap().is_empty());

  let latest = s.latest_dismissed_alert(pair).await.unwrap().unwrap();
  assert_eq!(latest.alert_id, alert.alert_id);
  assert!(matches!(latest.status, AlertStatus::Dismissed { by: b, .. } if b == by));
}

#[tokio::test]
async fn system_dismissal_roundtrip() {
  let (s, pair) = seeded().await;
  let alert = warning(pair);
  s.insert_alert(alert.clone()).await.unwrap();

  let superseded = dismiss(&alert, Dismisser::System, Utc::now()).unwrap();
  assert!(s.update_alert(superseded, alert.version).await.unwrap());

  let got = s.get_alert(pair.tenant_id, alert.alert_id).await.unwrap().unwrap();
  assert!(matches!(got.status, AlertStatus::Dismissed { by: Dismisser::System, .. }));
}

#[tokio::test]
async fn stale_alert_update_is_rejected() {
  let (s, pair) = seeded().await;
  let alert = warning(pair);
  s.insert_alert(alert.clone()).await.unwrap();

  let mut bumped = alert.clone();
  bumped.severity = Severity::Critical;
  bumped.version = 2;
  assert!(s.update_alert(bumped.clone(), 1).await.unwrap());
  assert!(!s.update_alert(bumped, 1).await.unwrap());
}

#[tokio::test]
async fn active_alerts_are_ordered_by_severity() {
  let (s, pair) = seeded().await;
  let mut brakes = MaintenanceType::preventive(pair.tenant_id, "Brakes", MaintenanceCategory::Brakes, IntervalKind::Km);
  brakes.default_km_interval = Some(40_000);
  let brakes_pair = PairKey::new(pair.tenant_id, pair.vehicle_id, brakes.type_id);
  s.put_maintenance_type(brakes).await.unwrap();

  s.insert_alert(warning(pair)).await.unwrap();
  let mut critical = warning(brakes_pair);
  critical.severity = Severity::Critical;
  critical.alert_type = AlertType::Overdue;
  s.insert_alert(critical).await.unwrap();

  let alerts = s.list_active_alerts(pair.tenant_id).await.unwrap();
  assert_eq!(alerts.len(), 2);
  assert_eq!(alerts[0].severity, Severity::Critical);
  assert_eq!(alerts[1].severity, Severity::Warning);
}

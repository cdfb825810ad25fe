//! The `MaintenanceStore` trait.
//!
//! Implemented by storage backends (e.g. `fleetmaint-store-sqlite`). The
//! sweep and the engine depend on this abstraction, not on any concrete
//! backend. Every method is scoped by a tenant id supplied by the caller;
//! implementations never return rows of another tenant.
//!
//! Updates of records and alerts are compare-and-swap: they succeed only if
//! the stored row still has `expected_version`, and report a lost race as
//! `Ok(false)` rather than an error.

use std::future::Future;

use uuid::Uuid;

use crate::{
  PairKey,
  alert::MaintenanceAlert,
  baseline::PairBaseline,
  maintenance_type::MaintenanceType,
  plan::VehicleMaintenancePlan,
  record::MaintenanceRecord,
  vehicle::Vehicle,
};

/// Abstraction over a maintenance store backend.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait MaintenanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Vehicles ──────────────────────────────────────────────────────────

  /// Insert or replace a vehicle snapshot.
  fn put_vehicle(
    &self,
    vehicle: Vehicle,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_vehicle(
    &self,
    tenant_id: Uuid,
    vehicle_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vehicle>, Self::Error>> + Send + '_;

  fn list_active_vehicles(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Vehicle>, Self::Error>> + Send + '_;

  /// Advance a vehicle's odometer. Fails if the reading would go backwards.
  fn update_odometer(
    &self,
    tenant_id: Uuid,
    vehicle_id: Uuid,
    odometer_km: i64,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  // ── Maintenance types ─────────────────────────────────────────────────

  /// Insert or replace a maintenance type.
  fn put_maintenance_type(
    &self,
    maintenance_type: MaintenanceType,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_maintenance_type(
    &self,
    tenant_id: Uuid,
    type_id: Uuid,
  ) -> impl Future<Output = Result<Option<MaintenanceType>, Self::Error>> + Send + '_;

  /// Active types of class PREVENTIVE.
  fn list_active_preventive_types(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MaintenanceType>, Self::Error>> + Send + '_;

  // ── Plans ─────────────────────────────────────────────────────────────

  /// Create a plan. Fails if the pair already has one.
  fn add_plan(
    &self,
    plan: VehicleMaintenancePlan,
  ) -> impl Future<Output = Result<VehicleMaintenancePlan, Self::Error>> + Send + '_;

  /// Replace the enabled flag and overrides of an existing plan.
  fn update_plan(
    &self,
    plan: VehicleMaintenancePlan,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a plan. Returns `false` if there was none.
  fn delete_plan(
    &self,
    tenant_id: Uuid,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_plan(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<VehicleMaintenancePlan>, Self::Error>> + Send + '_;

  fn list_plans(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<VehicleMaintenancePlan>, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  fn insert_record(
    &self,
    record: MaintenanceRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_record(
    &self,
    tenant_id: Uuid,
    record_id: Uuid,
  ) -> impl Future<Output = Result<Option<MaintenanceRecord>, Self::Error>> + Send + '_;

  /// Compare-and-swap `record` over the row stored at `expected_version`.
  fn update_record(
    &self,
    record: MaintenanceRecord,
    expected_version: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The most recently executed COMPLETED record of a pair.
  fn last_completed_record(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<MaintenanceRecord>, Self::Error>> + Send + '_;

  /// SCHEDULED and OVERDUE records of a pair.
  fn open_records(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Vec<MaintenanceRecord>, Self::Error>> + Send + '_;

  // ── Baselines ─────────────────────────────────────────────────────────

  fn pair_baseline(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<PairBaseline>, Self::Error>> + Send + '_;

  /// Store `baseline` unless the pair already has one, and return the
  /// stored row. The first observation wins.
  fn ensure_pair_baseline(
    &self,
    baseline: PairBaseline,
  ) -> impl Future<Output = Result<PairBaseline, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  fn insert_alert(
    &self,
    alert: MaintenanceAlert,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_alert(
    &self,
    tenant_id: Uuid,
    alert_id: Uuid,
  ) -> impl Future<Output = Result<Option<MaintenanceAlert>, Self::Error>> + Send + '_;

  /// Compare-and-swap `alert` over the row stored at `expected_version`.
  fn update_alert(
    &self,
    alert: MaintenanceAlert,
    expected_version: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The pair's active (non-dismissed) alert.
  fn active_alert(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<MaintenanceAlert>, Self::Error>> + Send + '_;

  /// The pair's most recently dismissed alert.
  fn latest_dismissed_alert(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<MaintenanceAlert>, Self::Error>> + Send + '_;

  /// Every active alert of a tenant, most severe first.
  fn list_active_alerts(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MaintenanceAlert>, Self::Error>> + Send + '_;
}

//! Store-backed maintenance operations.
//!
//! Every operation that touches a pair's alerts or records runs under that
//! pair's lock, and every write is a version-checked compare-and-swap. A lost
//! race surfaces as [`Error::ConcurrencyConflict`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetmaint_core::{
  Error, PairKey,
  alert::{AlertDecision, Dismisser, MaintenanceAlert, decide_upsert, dismiss},
  baseline::PairBaseline,
  due::{DueStatus, compute_due_status},
  interval::{Interval, resolve_interval},
  maintenance_type::MaintenanceType,
  plan::VehicleMaintenancePlan,
  record::{
    Actor, MaintenanceRecord, NewRecord, RecordEdit, TransitionContext, TransitionRequest,
    apply_edit, open_record, transition,
  },
  severity::classify,
  store::MaintenanceStore,
  vehicle::Vehicle,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  error::{EngineError, Result},
  locks::PairLocks,
};

/// What a pair's alert ended up as after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
  Created,
  Updated,
  Unchanged,
  Suppressed,
  /// Neither axis crossed its threshold; existing alerts were left alone.
  NoAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairOutcome {
  pub alert:                  AlertOutcome,
  pub due:                    DueStatus,
  pub records_marked_overdue: usize,
}

pub struct MaintenanceEngine<S> {
  store: Arc<S>,
  locks: PairLocks,
}

impl<S> MaintenanceEngine<S>
where
  S: MaintenanceStore + 'static,
{
  pub fn new(store: Arc<S>) -> Self { Self { store, locks: PairLocks::new() } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn locks(&self) -> &PairLocks { &self.locks }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn load_type(&self, tenant_id: Uuid, type_id: Uuid) -> Result<MaintenanceType> {
    self
      .store
      .get_maintenance_type(tenant_id, type_id)
      .await
      .map_err(EngineError::store)?
      .ok_or_else(|| Error::NotFound { kind: "maintenance type", id: type_id }.into())
  }

  async fn load_vehicle(&self, tenant_id: Uuid, vehicle_id: Uuid) -> Result<Vehicle> {
    self
      .store
      .get_vehicle(tenant_id, vehicle_id)
      .await
      .map_err(EngineError::store)?
      .ok_or_else(|| Error::NotFound { kind: "vehicle", id: vehicle_id }.into())
  }

  async fn load_record(&self, tenant_id: Uuid, record_id: Uuid) -> Result<MaintenanceRecord> {
    self
      .store
      .get_record(tenant_id, record_id)
      .await
      .map_err(EngineError::store)?
      .ok_or_else(|| Error::record_not_found(record_id).into())
  }

  /// The effective interval of a pair under the current type and plan.
  pub async fn effective_interval(&self, pair: PairKey) -> Result<Interval> {
    let maintenance_type = self.load_type(pair.tenant_id, pair.type_id).await?;
    let plan = self.store.get_plan(pair).await.map_err(EngineError::store)?;
    Ok(resolve_interval(&maintenance_type, plan.as_ref())?)
  }

  /// The current due status of a pair, without touching alerts or
  /// recording an activation baseline.
  pub async fn due_status(&self, pair: PairKey, now: DateTime<Utc>) -> Result<DueStatus> {
    let interval = self.effective_interval(pair).await?;
    let vehicle = self.load_vehicle(pair.tenant_id, pair.vehicle_id).await?;
    let last = self
      .store
      .last_completed_record(pair)
      .await
      .map_err(EngineError::store)?;
    let activation = match last {
      Some(_) => None,
      None => self.store.pair_baseline(pair).await.map_err(EngineError::store)?,
    };
    Ok(compute_due_status(
      &interval,
      vehicle.odometer_km,
      now.date_naive(),
      last.as_ref(),
      activation.as_ref(),
    ))
  }

  /// Interval used for a completion snapshot. A misconfigured type must not
  /// block recording work that was actually done, so configuration errors
  /// degrade to "no snapshot".
  async fn snapshot_interval(&self, pair: Option<PairKey>) -> Result<Option<Interval>> {
    let Some(pair) = pair else {
      return Ok(None);
    };
    match self.effective_interval(pair).await {
      Ok(interval) => Ok(Some(interval)),
      Err(e) if e.is_config() => {
        warn!(%pair, error = %e, "no next-due snapshot for completed record");
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Create a record from a user submission. A submission that carries a
  /// completion payload is stored directly as COMPLETED and supersedes the
  /// pair's active alert.
  ///
  /// The record is returned once it is stored. Failing to dismiss the
  /// superseded alert is logged and left to the next sweep.
  pub async fn create_record(
    &self,
    input: NewRecord,
    actor: Actor,
    now: DateTime<Utc>,
  ) -> Result<MaintenanceRecord> {
    let pair = input
      .type_id
      .map(|type_id| PairKey::new(input.tenant_id, input.vehicle_id, type_id));
    let _guard = match pair {
      Some(p) => Some(self.locks.lock(p).await),
      None => None,
    };

    let interval = match &input.completion {
      Some(_) => self.snapshot_interval(pair).await?,
      None => None,
    };
    let ctx = TransitionContext { actor, now, today: now.date_naive(), interval };
    let outcome = open_record(input, &ctx)?;

    self
      .store
      .insert_record(outcome.record.clone())
      .await
      .map_err(EngineError::store)?;
    info!(
      record = %outcome.record.record_id,
      vehicle = %outcome.record.vehicle_id,
      status = %outcome.record.status,
      "maintenance record created"
    );

    if let Some(p) = outcome.supersedes {
      self.supersede_after_completion(p, outcome.record.record_id, now).await;
    }
    Ok(outcome.record)
  }

  /// Move a record to a new status. A completion supersedes the pair's
  /// active alert the same way [`Self::create_record`] does.
  pub async fn transition_record(
    &self,
    tenant_id: Uuid,
    record_id: Uuid,
    request: TransitionRequest,
    actor: Actor,
    now: DateTime<Utc>,
  ) -> Result<MaintenanceRecord> {
    let pair = self.load_record(tenant_id, record_id).await?.pair();
    let _guard = match pair {
      Some(p) => Some(self.locks.lock(p).await),
      None => None,
    };

    // Re-read under the lock; the record may have moved meanwhile.
    let record = self.load_record(tenant_id, record_id).await?;
    let interval = match request {
      TransitionRequest::Complete(_) => self.snapshot_interval(pair).await?,
      _ => None,
    };
    let ctx = TransitionContext { actor, now, today: now.date_naive(), interval };
    let outcome = transition(&record, request, &ctx)?;

    self.write_record(&outcome.record, record.version).await?;
    info!(
      record = %record_id,
      from = %outcome.from,
      to = %outcome.record.status,
      "maintenance record transitioned"
    );

    if let Some(p) = outcome.supersedes {
      self.supersede_after_completion(p, record_id, now).await;
    }
    Ok(outcome.record)
  }

  /// Edit the fields of an open record.
  pub async fn edit_record(
    &self,
    tenant_id: Uuid,
    record_id: Uuid,
    edit: RecordEdit,
    now: DateTime<Utc>,
  ) -> Result<MaintenanceRecord> {
    let pair = self.load_record(tenant_id, record_id).await?.pair();
    let _guard = match pair {
      Some(p) => Some(self.locks.lock(p).await),
      None => None,
    };

    let record = self.load_record(tenant_id, record_id).await?;
    let next = apply_edit(&record, edit, now)?;
    self.write_record(&next, record.version).await?;
    Ok(next)
  }

  async fn write_record(&self, record: &MaintenanceRecord, expected_version: i64) -> Result<()> {
    let written = self
      .store
      .update_record(record.clone(), expected_version)
      .await
      .map_err(EngineError::store)?;
    if !written {
      return Err(
        Error::ConcurrencyConflict { kind: "maintenance record", id: record.record_id }.into(),
      );
    }
    Ok(())
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn write_alert(&self, alert: &MaintenanceAlert, expected_version: i64) -> Result<()> {
    let written = self
      .store
      .update_alert(alert.clone(), expected_version)
      .await
      .map_err(EngineError::store)?;
    if !written {
      return Err(Error::ConcurrencyConflict { kind: "alert", id: alert.alert_id }.into());
    }
    Ok(())
  }

  /// Dismiss the pair's active alert on behalf of the system. Caller holds
  /// the pair lock.
  async fn supersede(&self, pair: PairKey, now: DateTime<Utc>) -> Result<Option<MaintenanceAlert>> {
    let Some(active) = self.store.active_alert(pair).await.map_err(EngineError::store)? else {
      return Ok(None);
    };
    let Some(dismissed) = dismiss(&active, Dismisser::System, now) else {
      return Ok(None);
    };
    self.write_alert(&dismissed, active.version).await?;
    info!(%pair, alert = %active.alert_id, "alert superseded by completed maintenance");
    Ok(Some(dismissed))
  }

  /// The completed record is already stored, so a failed supersession only
  /// leaves the alert active until the next sweep of the pair supersedes it.
  async fn supersede_after_completion(&self, pair: PairKey, record_id: Uuid, now: DateTime<Utc>) {
    if let Err(e) = self.supersede(pair, now).await {
      warn!(%pair, record = %record_id, error = %e, "failed to supersede alert after completion");
    }
  }

  /// Dismiss an alert at a user's request. Dismissing an already dismissed
  /// alert returns it unchanged.
  pub async fn dismiss_alert(
    &self,
    tenant_id: Uuid,
    alert_id: Uuid,
    by: Dismisser,
    now: DateTime<Utc>,
  ) -> Result<MaintenanceAlert> {
    let alert = self
      .store
      .get_alert(tenant_id, alert_id)
      .await
      .map_err(EngineError::store)?
      .ok_or_else(|| Error::alert_not_found(alert_id))?;

    let _guard = self.locks.lock(alert.pair()).await;

    let current = self
      .store
      .get_alert(tenant_id, alert_id)
      .await
      .map_err(EngineError::store)?
      .ok_or_else(|| Error::alert_not_found(alert_id))?;

    let Some(dismissed) = dismiss(&current, by, now) else {
      debug!(alert = %alert_id, "alert already dismissed");
      return Ok(current);
    };
    self.write_alert(&dismissed, current.version).await?;
    info!(alert = %alert_id, pair = %current.pair(), "alert dismissed");
    Ok(dismissed)
  }

  // ── Pair processing ───────────────────────────────────────────────────────

  /// Recompute one pair: resolve its interval, compute its due status, flag
  /// past-due SCHEDULED records OVERDUE and upsert its alert.
  ///
  /// A pair without a completed record is measured from the first time it
  /// was processed, which is recorded on that first run. An active alert
  /// older than the last completion is superseded before classification.
  ///
  /// Idempotent: running it again with the same inputs changes nothing.
  pub async fn process_pair(
    &self,
    vehicle: &Vehicle,
    maintenance_type: &MaintenanceType,
    plan: Option<&VehicleMaintenancePlan>,
    now: DateTime<Utc>,
  ) -> Result<PairOutcome> {
    let pair = PairKey::new(vehicle.tenant_id, vehicle.vehicle_id, maintenance_type.type_id);
    let interval = resolve_interval(maintenance_type, plan)?;

    let _guard = self.locks.lock(pair).await;
    let today = now.date_naive();

    let last = self
      .store
      .last_completed_record(pair)
      .await
      .map_err(EngineError::store)?;
    let activation = match last {
      Some(_) => None,
      None => Some(
        self
          .store
          .ensure_pair_baseline(PairBaseline::observe(pair, vehicle.odometer_km, now))
          .await
          .map_err(EngineError::store)?,
      ),
    };
    let due = compute_due_status(&interval, vehicle.odometer_km, today, last.as_ref(), activation.as_ref());

    let records_marked_overdue = self.mark_overdue(pair, &due, now).await?;

    let mut active = self.store.active_alert(pair).await.map_err(EngineError::store)?;
    let stale = matches!(
      (&active, &last),
      (Some(alert), Some(record)) if alert.updated_at < record.updated_at
    );
    if stale {
      // Left behind by a completion whose supersession failed.
      self.supersede(pair, now).await?;
      active = None;
    }

    let Some(candidate) = classify(&due, &maintenance_type.thresholds()) else {
      debug!(%pair, ?due, "pair not within alert thresholds");
      return Ok(PairOutcome { alert: AlertOutcome::NoAlert, due, records_marked_overdue });
    };

    let last_dismissed = match active {
      Some(_) => None,
      None => self
        .store
        .latest_dismissed_alert(pair)
        .await
        .map_err(EngineError::store)?,
    };

    let alert = match decide_upsert(pair, active.as_ref(), last_dismissed.as_ref(), &candidate, now) {
      AlertDecision::Create(alert) => {
        info!(
          %pair,
          alert = %alert.alert_id,
          severity = %alert.severity,
          alert_type = %alert.alert_type,
          "maintenance alert raised"
        );
        self
          .store
          .insert_alert(alert)
          .await
          .map_err(EngineError::store)?;
        AlertOutcome::Created
      }
      AlertDecision::Update(alert) => {
        let expected = alert.version - 1;
        debug!(%pair, alert = %alert.alert_id, severity = %alert.severity, "maintenance alert updated");
        self.write_alert(&alert, expected).await?;
        AlertOutcome::Updated
      }
      AlertDecision::Unchanged => AlertOutcome::Unchanged,
      AlertDecision::Suppressed => {
        debug!(%pair, "candidate suppressed by earlier dismissal");
        AlertOutcome::Suppressed
      }
    };

    Ok(PairOutcome { alert, due, records_marked_overdue })
  }

  async fn mark_overdue(&self, pair: PairKey, due: &DueStatus, now: DateTime<Utc>) -> Result<usize> {
    let today = now.date_naive();
    let open = self.store.open_records(pair).await.map_err(EngineError::store)?;

    let ctx = TransitionContext { actor: Actor::System, now, today, interval: None };
    let mut marked = 0;
    for record in open.iter().filter(|r| r.is_past_due(due, today)) {
      let outcome = transition(record, TransitionRequest::MarkOverdue, &ctx)?;
      self.write_record(&outcome.record, record.version).await?;
      info!(%pair, record = %record.record_id, "maintenance record overdue");
      marked += 1;
    }
    Ok(marked)
  }
}

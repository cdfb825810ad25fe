//! The scheduling sweep: recompute every candidate pair of a tenant.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use fleetmaint_core::{
  PairKey, maintenance_type::MaintenanceType, plan::VehicleMaintenancePlan,
  store::MaintenanceStore, vehicle::Vehicle,
};
use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  engine::{AlertOutcome, MaintenanceEngine, PairOutcome},
  error::{EngineError, Result},
};

/// Why a pair could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  Config,
  Conflict,
  Domain,
  Store,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
  pub pair:  PairKey,
  pub kind:  FailureKind,
  pub error: String,
}

impl PairFailure {
  fn new(pair: PairKey, error: &EngineError) -> Self {
    let kind = if error.is_config() {
      FailureKind::Config
    } else if error.is_conflict() {
      FailureKind::Conflict
    } else if matches!(error, EngineError::Store(_)) {
      FailureKind::Store
    } else {
      FailureKind::Domain
    };
    Self { pair, kind, error: error.to_string() }
  }
}

/// Summary of one sweep over one tenant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
  pub tenant_id:              Uuid,
  pub pairs_examined:         usize,
  pub created:                usize,
  pub updated:                usize,
  pub unchanged:              usize,
  pub suppressed:             usize,
  pub skipped_no_alert:       usize,
  pub records_marked_overdue: usize,
  pub failures:               Vec<PairFailure>,
  /// The sweep stopped early; some pairs were not examined.
  pub cancelled:              bool,
}

impl SweepReport {
  fn record(&mut self, outcome: PairOutcome) {
    self.records_marked_overdue += outcome.records_marked_overdue;
    match outcome.alert {
      AlertOutcome::Created => self.created += 1,
      AlertOutcome::Updated => self.updated += 1,
      AlertOutcome::Unchanged => self.unchanged += 1,
      AlertOutcome::Suppressed => self.suppressed += 1,
      AlertOutcome::NoAlert => self.skipped_no_alert += 1,
    }
  }
}

struct PairInput {
  vehicle:          Vehicle,
  maintenance_type: Arc<MaintenanceType>,
  plan:             Option<VehicleMaintenancePlan>,
}

impl PairInput {
  fn pair(&self) -> PairKey {
    PairKey::new(self.vehicle.tenant_id, self.vehicle.vehicle_id, self.maintenance_type.type_id)
  }
}

/// Every active vehicle crossed with every active preventive type, keeping
/// pairs that are enabled. A pair without a plan is enabled only for
/// mandatory types.
async fn candidate_pairs<S: MaintenanceStore>(store: &S, tenant_id: Uuid) -> Result<Vec<PairInput>> {
  let vehicles = store
    .list_active_vehicles(tenant_id)
    .await
    .map_err(EngineError::store)?;
  let types = store
    .list_active_preventive_types(tenant_id)
    .await
    .map_err(EngineError::store)?;
  let mut plans: HashMap<(Uuid, Uuid), VehicleMaintenancePlan> = store
    .list_plans(tenant_id)
    .await
    .map_err(EngineError::store)?
    .into_iter()
    .map(|p| ((p.vehicle_id, p.type_id), p))
    .collect();

  let types: Vec<Arc<MaintenanceType>> = types.into_iter().map(Arc::new).collect();
  let mut pairs = Vec::with_capacity(vehicles.len() * types.len());
  for vehicle in vehicles {
    for maintenance_type in &types {
      let plan = plans.remove(&(vehicle.vehicle_id, maintenance_type.type_id));
      let enabled = match &plan {
        Some(plan) => plan.enabled,
        None => maintenance_type.mandatory,
      };
      if !enabled {
        debug!(
          vehicle = %vehicle.vehicle_id,
          maintenance_type = %maintenance_type.type_id,
          "pair disabled"
        );
        continue;
      }
      pairs.push(PairInput {
        vehicle: vehicle.clone(),
        maintenance_type: Arc::clone(maintenance_type),
        plan,
      });
    }
  }
  Ok(pairs)
}

async fn process_with_retry<S: MaintenanceStore + 'static>(
  engine: &MaintenanceEngine<S>,
  input: &PairInput,
  now: DateTime<Utc>,
) -> Result<PairOutcome> {
  let run = || engine.process_pair(&input.vehicle, &input.maintenance_type, input.plan.as_ref(), now);
  match run().await {
    Err(e) if e.is_conflict() => {
      warn!(pair = %input.pair(), error = %e, "conflict while processing pair, retrying");
      run().await
    }
    other => other,
  }
}

/// Run one sweep over `tenant_id`.
///
/// Pairs are processed on at most `max_concurrency` tasks. Per-pair errors
/// are collected in the report; only failing to enumerate the tenant's pairs
/// is an error. Cancelling `cancel` stops the sweep before the next pair
/// starts; pairs already in flight finish.
pub async fn run_sweep<S: MaintenanceStore + 'static>(
  engine: Arc<MaintenanceEngine<S>>,
  tenant_id: Uuid,
  now: DateTime<Utc>,
  max_concurrency: usize,
  cancel: CancellationToken,
) -> Result<SweepReport> {
  let mut report = SweepReport { tenant_id, ..SweepReport::default() };
  let pairs = candidate_pairs(engine.store().as_ref(), tenant_id).await?;
  debug!(tenant = %tenant_id, pairs = pairs.len(), "sweep started");

  let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
  let mut tasks: JoinSet<(PairKey, Result<PairOutcome>)> = JoinSet::new();

  for input in pairs {
    let permit = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        report.cancelled = true;
        break;
      }
      permit = Arc::clone(&permits).acquire_owned() => match permit {
        Ok(permit) => permit,
        Err(_) => break,
      },
    };

    let engine = Arc::clone(&engine);
    tasks.spawn(async move {
      let _permit = permit;
      let result = process_with_retry(&engine, &input, now).await;
      (input.pair(), result)
    });
  }

  while let Some(joined) = tasks.join_next().await {
    let (pair, result) = match joined {
      Ok(done) => done,
      Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
      Err(e) => {
        warn!(tenant = %tenant_id, error = %e, "pair task aborted");
        continue;
      }
    };
    report.pairs_examined += 1;
    match result {
      Ok(outcome) => report.record(outcome),
      Err(e) => {
        warn!(%pair, error = %e, "pair failed");
        report.failures.push(PairFailure::new(pair, &e));
      }
    }
  }

  engine.locks().prune();

  info!(
    tenant = %tenant_id,
    examined = report.pairs_examined,
    created = report.created,
    updated = report.updated,
    unchanged = report.unchanged,
    suppressed = report.suppressed,
    overdue = report.records_marked_overdue,
    failures = report.failures.len(),
    cancelled = report.cancelled,
    "sweep finished"
  );
  Ok(report)
}

//! Runtime configuration of the sweeper.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use uuid::Uuid;

/// Sweeper configuration, deserialised from `config.toml` and `FLEETMAINT_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
  pub store_path:      PathBuf,
  /// Tenants to sweep on every cycle.
  #[serde(default)]
  pub tenants:         Vec<Uuid>,
  #[serde(default = "default_interval_secs")]
  pub interval_secs:   u64,
  /// Upper bound on pairs processed concurrently.
  #[serde(default = "default_max_concurrency")]
  pub max_concurrency: usize,
  /// Run a single sweep and exit.
  #[serde(default)]
  pub run_once:        bool,
}

fn default_interval_secs() -> u64 { 3600 }

fn default_max_concurrency() -> usize { 8 }

impl SweepConfig {
  pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs.max(1)) }
}

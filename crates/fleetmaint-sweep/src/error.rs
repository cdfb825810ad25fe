//! Engine error type.

use thiserror::Error;

/// An error returned by a [`MaintenanceEngine`](crate::MaintenanceEngine)
/// operation.
#[derive(Debug, Error)]
pub enum EngineError {
  /// A domain rule rejected the operation (bad configuration, invalid
  /// transition, immutable record, missing entity, lost race).
  #[error(transparent)]
  Domain(#[from] fleetmaint_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self { Self::Store(Box::new(e)) }

  pub fn is_conflict(&self) -> bool { matches!(self, Self::Domain(e) if e.is_conflict()) }

  pub fn is_config(&self) -> bool { matches!(self, Self::Domain(fleetmaint_core::Error::Config(_))) }
}

impl From<fleetmaint_core::ConfigError> for EngineError {
  fn from(e: fleetmaint_core::ConfigError) -> Self { Self::Domain(e.into()) }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

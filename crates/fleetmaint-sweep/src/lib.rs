//! Store-backed maintenance engine and the periodic scheduling sweep.
//!
//! [`MaintenanceEngine`] applies the pure decisions of `fleetmaint-core` to
//! any [`MaintenanceStore`](fleetmaint_core::store::MaintenanceStore), holding
//! a per-pair lock so that a record completion and a sweep never interleave
//! on the same (vehicle, maintenance type) pair. [`run_sweep`] drives the
//! engine over every candidate pair of a tenant on a bounded worker pool.

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod sweep;

pub use config::SweepConfig;
pub use engine::{AlertOutcome, MaintenanceEngine, PairOutcome};
pub use error::EngineError;
pub use sweep::{FailureKind, PairFailure, SweepReport, run_sweep};

//! Core types and pure scheduling logic for fleet preventive maintenance.
//!
//! No database or runtime dependencies. Interval resolution, due-status
//! computation and severity classification are pure functions over
//! pre-fetched snapshots. Alert and record lifecycle rules return decisions
//! that a store-backed caller applies.

pub mod alert;
pub mod baseline;
pub mod due;
pub mod error;
pub mod interval;
pub mod maintenance_type;
pub mod pair;
pub mod plan;
pub mod record;
pub mod severity;
pub mod store;
pub mod vehicle;

pub use error::{ConfigError, Error, Result};
pub use pair::PairKey;

//! Error type for `fleetmaint-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain rule violated by a write (duplicate plan, odometer regression,
  /// missing row).
  #[error("core error: {0}")]
  Core(#[from] fleetmaint_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column holds a value no domain enum variant maps to.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

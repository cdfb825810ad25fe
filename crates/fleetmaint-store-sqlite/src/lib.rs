//! SQLite backend for the fleet maintenance engine.
//!
//! Every query runs inside a [`tokio_rusqlite`] `call` on the connection's own
//! thread. Record and alert rows carry a `version` column for
//! compare-and-swap updates.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

//! Per-pair mutual exclusion.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use fleetmaint_core::PairKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held while a pair's alerts or records are being read-modify-written.
pub type PairGuard = OwnedMutexGuard<()>;

/// A map of async mutexes keyed by [`PairKey`].
///
/// Distinct pairs never contend. Entries are created on first use and
/// dropped by [`PairLocks::prune`] once nobody holds or waits on them.
#[derive(Clone, Default)]
pub struct PairLocks {
  inner: Arc<Mutex<HashMap<PairKey, Arc<AsyncMutex<()>>>>>,
}

impl PairLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `pair`.
  pub async fn lock(&self, pair: PairKey) -> PairGuard {
    let slot = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      map.entry(pair).or_default().clone()
    };
    slot.lock_owned().await
  }

  /// Forget locks that are neither held nor awaited.
  pub fn prune(&self) {
    let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.retain(|_, slot| Arc::strong_count(slot) > 1);
  }

  pub fn len(&self) -> usize { self.inner.lock().unwrap_or_else(PoisonError::into_inner).len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

//! Per-deal row locking.
//!
//! sled gives atomicity across trees via `(&tree_a, &tree_b, ...).transaction(...)`
//! but not row-level *locking* held across `.await` points, and a deal
//! transition needs to hold a lock across `.await` points — e.g. while a
//! chain call happens mid-transition. `DealLocks` is a `tokio::sync::Mutex`
//! per deal id, held in a registry, giving the same serializability
//! guarantee for a single-process deployment that a `SELECT ... FOR
//! UPDATE` row lock would. See `DESIGN.md` for the Open Question this
//! resolves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use advault_core::types::DealId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct DealLocks {
    registry: Mutex<HashMap<DealId, Arc<AsyncMutex<()>>>>,
}

/// Holds the per-deal mutex for the lifetime of the caller's critical
/// section. Dropping it releases the lock.
pub struct DealGuard {
    _guard: OwnedMutexGuard<()>,
}

impl DealLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: DealId) -> Arc<AsyncMutex<()>> {
        let mut registry = self.registry.lock().expect("deal lock registry poisoned");
        registry.entry(id).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Acquire the exclusive lock for `id`, blocking (async) until available.
    pub async fn lock(&self, id: DealId) -> DealGuard {
        let mutex = self.entry(id);
        let guard = mutex.lock_owned().await;
        DealGuard { _guard: guard }
    }
}

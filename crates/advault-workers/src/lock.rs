//! Per-target distributed lock stand-in.
//!
//! Workers hold a lock keyed by their target (e.g.
//! `stats-refresh:{channel_id}`) before acting, so multiple scheduler
//! replicas don't duplicate work. `InProcessLock` is a single-process
//! stand-in: a `tokio::sync::Mutex` per key, the same shape as
//! `advault_store::DealLocks` one level up from deal rows. `DistributedLock`
//! is the trait seam a real Redis-backed implementation would slot into
//! without touching call sites — see `DESIGN.md`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Holds the named lock for the lifetime of the worker's critical
/// section. Dropping it releases the lock — a crashed holder releases
/// immediately rather than waiting out a TTL, which is strictly better
/// than the Redis description it stands in for.
pub struct LockGuard {
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    async fn acquire(&self, key: &str) -> LockGuard;
}

#[derive(Default)]
pub struct InProcessLock {
    registry: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl InProcessLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut registry = self.registry.lock().expect("worker lock registry poisoned");
        registry.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }
}

#[async_trait]
impl DistributedLock for InProcessLock {
    async fn acquire(&self, key: &str) -> LockGuard {
        let mutex = self.entry(key);
        let guard = mutex.lock_owned().await;
        LockGuard { _guard: guard }
    }
}

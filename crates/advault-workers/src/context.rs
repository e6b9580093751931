//! Worker context: the explicit-dependency bundle every processor
//! function takes a reference to, flattened into one struct since the
//! worker layer has no further downstream consumer to hand pieces of
//! it to selectively.

use std::sync::Arc;

use advault_chain::EscrowWallet;
use advault_dispute::DisputeProtocol;
use advault_engine::{DealEngine, RequirementEvaluator};
use advault_notify::NotificationSink;
use advault_platform::AdapterRegistry;
use advault_saga::EscrowSaga;
use advault_store::LedgerStore;

use crate::lock::DistributedLock;

pub struct WorkerContext {
    pub store: Arc<LedgerStore>,
    pub engine: Arc<DealEngine>,
    pub evaluator: Arc<RequirementEvaluator>,
    pub saga: Arc<EscrowSaga>,
    pub dispute: Arc<DisputeProtocol>,
    pub wallet: Arc<EscrowWallet>,
    pub adapters: Arc<AdapterRegistry>,
    pub notifier: Arc<dyn NotificationSink>,
    pub locks: Arc<dyn DistributedLock>,
    /// Days a completed deal's data is retained before the purge worker removes it.
    pub purge_retention_days: i64,
    /// Cap on channels refreshed per stats-refresh cycle.
    pub stats_refresh_batch_size: usize,
}

impl WorkerContext {
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }
}

/// Outcome of one worker pass over its candidate set. Never a bare
/// `()` — a per-item failure is logged and counted, not propagated, so
/// one bad row can't stall the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub items_processed: u32,
    pub items_failed: u32,
}

impl WorkerReport {
    pub fn record_success(&mut self) {
        self.items_processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.items_failed += 1;
    }

    pub fn merge(&mut self, other: WorkerReport) {
        self.items_processed += other.items_processed;
        self.items_failed += other.items_failed;
    }
}

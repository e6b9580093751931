//! Worker scheduler and purge & receipt.
//!
//! Each job is a processor function taking `&WorkerContext` and
//! returning a [`WorkerReport`], never a bare `()` — a caller can
//! log/alert on partial failure without the pass itself aborting.
//! Scheduling is out of scope here (`advault-node` drives these on
//! `tokio::time::interval` ticks); this crate only defines what a tick
//! does.

pub mod context;
pub mod error;
pub mod escalate;
pub mod lock;
pub mod metrics;
pub mod payment;
pub mod purge;
pub mod recovery;
pub mod report;
pub mod stats;
pub mod timeout;

pub use context::WorkerContext;
pub use error::WorkerError;
pub use escalate::escalate_overdue_disputes;
pub use lock::{DistributedLock, InProcessLock, LockGuard};
pub use metrics::track_metrics;
pub use payment::detect_payments;
pub use purge::purge_completed_deals;
pub use recovery::recover_pending_transfers;
pub use report::WorkerReport;
pub use stats::refresh_stats;
pub use timeout::sweep_timeouts;

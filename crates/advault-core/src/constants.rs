//! ─── AdVault deal-engine constants ──────────────────────────────────────
//!
//! Numeric policy values kept in one place so call sites never hardcode
//! a magic number.

use crate::types::DealStatus;

/// Minimum/maximum verification window, in hours.
pub const VERIFICATION_WINDOW_MIN_HOURS: u32 = 1;
pub const VERIFICATION_WINDOW_MAX_HOURS: u32 = 720;

/// Default verification window when a deal doesn't override it (config
/// key `verifyHoldHours`).
pub const DEFAULT_VERIFY_HOLD_HOURS: u32 = 72;

/// Soft per-state timeout, in hours, used to compute `timeout_at` on
/// entry to a state. `None` = no soft timer for that state.
pub fn soft_timeout_hours(status: DealStatus) -> Option<i64> {
    match status {
        DealStatus::PendingPayment => Some(24),
        DealStatus::Funded => Some(72),
        DealStatus::CreativePending => Some(72),
        DealStatus::CreativeSubmitted => Some(96),
        DealStatus::CreativeRevision => Some(72),
        DealStatus::CreativeApproved => Some(168),
        _ => None,
    }
}

/// Dispute mutual-resolution window.
pub const DISPUTE_MUTUAL_WINDOW_HOURS: i64 = 48;

/// Maximum hop-2 retry attempts for a `PendingTransfer` before the saga
/// recovery worker gives up and leaves it for operator action.
pub const SAGA_MAX_RETRIES: u32 = 5;

/// Chain confirmation polling.
pub const CHAIN_POLL_INTERVAL_SECS: u64 = 3;
pub const CHAIN_CONFIRMATION_DEADLINE_SECS: u64 = 60;

/// RPC fail-over policy.
pub const CHAIN_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default post-completion retention before a deal is purged by the
/// periodic purge worker.
pub const PURGE_RETENTION_DAYS: i64 = 30;

/// Outbound HTTP / platform-adapter call deadline.
pub const ADAPTER_CALL_DEADLINE_SECS: u64 = 15;

/// Worker distributed-lock TTL.
pub const WORKER_LOCK_TTL_SECS: u64 = 60;

/// Bounds on a deal's requirement list.
pub const MIN_REQUIREMENTS_PER_DEAL: usize = 1;
pub const MAX_REQUIREMENTS_PER_DEAL: usize = 10;

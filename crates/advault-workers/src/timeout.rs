//! Timeout sweep.
//!
//! Every ~60s: any Deal whose soft `timeout_at` has elapsed and whose
//! status is neither terminal nor already `TimedOut` is swept into
//! `TimedOut`. The saga recovery worker and the operator take it
//! from there — this worker only flips the flag.

use advault_core::time::now;
use advault_core::types::DealStatus;
use advault_notify::DealStatusChanged;
use serde_json::json;
use tracing::warn;

use crate::context::WorkerContext;
use crate::report::WorkerReport;

const SWEEPABLE_STATUSES: &[DealStatus] = &[
    DealStatus::PendingPayment,
    DealStatus::Funded,
    DealStatus::CreativePending,
    DealStatus::CreativeSubmitted,
    DealStatus::CreativeRevision,
    DealStatus::CreativeApproved,
    DealStatus::Posted,
    DealStatus::Tracking,
];

pub async fn sweep_timeouts(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();
    let now_ts = now();

    for &status in SWEEPABLE_STATUSES {
        let deals = match ctx.store.iter_deals_with_status(status) {
            Ok(deals) => deals,
            Err(e) => {
                warn!(error = %e, ?status, "timeout sweep: failed to list deals");
                report.record_failure();
                continue;
            }
        };

        for deal in deals {
            let Some(timeout_at) = deal.timeout_at else { continue };
            if timeout_at > now_ts {
                continue;
            }
            let _guard = ctx.locks.acquire(&format!("timeout-sweep:{}", deal.id)).await;

            match ctx
                .engine
                .transition(deal.id, DealStatus::TimedOut, None, json!({ "reason": "soft timeout elapsed" }))
                .await
            {
                Ok(_) => {
                    ctx.notifier.notify(DealStatusChanged {
                        deal_id: deal.id,
                        old_status: status,
                        new_status: DealStatus::TimedOut,
                        at: now_ts,
                    });
                    report.record_success();
                }
                Err(e) => {
                    warn!(deal_id = %deal.id, error = %e, "timeout sweep: transition failed");
                    report.record_failure();
                }
            }
        }
    }

    report
}

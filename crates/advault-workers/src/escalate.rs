//! Dispute escalator.
//!
//! Every ~15 min: any dispute whose mutual-resolution window has
//! elapsed while still `Open` or `MutualResolution` moves to
//! `AdminReview`. The deal itself stays `Disputed` — only an admin
//! resolution or a mutual acceptance can move it further.

use advault_core::time::now;
use advault_core::types::DisputeStatus;
use tracing::warn;

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn escalate_overdue_disputes(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();
    let now_ts = now();

    for status in [DisputeStatus::Open, DisputeStatus::MutualResolution] {
        let disputes = match ctx.store.iter_disputes_with_status(status) {
            Ok(disputes) => disputes,
            Err(e) => {
                warn!(error = %e, ?status, "dispute escalator: failed to list disputes");
                report.record_failure();
                continue;
            }
        };

        for dispute in disputes {
            if dispute.mutual_deadline > now_ts {
                continue;
            }
            let _guard = ctx.locks.acquire(&format!("dispute-escalate:{}", dispute.id)).await;
            match ctx.dispute.escalate(dispute.id) {
                Ok(_) => report.record_success(),
                Err(e) => {
                    warn!(dispute_id = %dispute.id, error = %e, "dispute escalator: escalation failed");
                    report.record_failure();
                }
            }
        }
    }

    report
}

//! Payment detector.
//!
//! Every ~30s (driven by `advault-node`'s scheduler): for each Deal in
//! `PendingPayment` with an escrow address, read the chain balance; once
//! it covers the deal amount, transition `Funded` then immediately
//! `CreativePending` and record the deposit. Per-item failures are
//! logged and counted rather than aborting the whole pass.

use advault_core::entities::Transaction;
use advault_core::time::now;
use advault_core::types::{DealStatus, TransactionType};
use advault_notify::DealStatusChanged;
use serde_json::json;
use tracing::{info, warn};

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn detect_payments(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();

    let pending = match ctx.store.iter_deals_with_status(DealStatus::PendingPayment) {
        Ok(deals) => deals,
        Err(e) => {
            warn!(error = %e, "payment detector: failed to list pending deals");
            report.record_failure();
            return report;
        }
    };

    for deal in pending {
        let Some(escrow_address) = deal.escrow_address.clone() else {
            continue;
        };
        let _guard = ctx.locks.acquire(&format!("payment-detect:{}", deal.id)).await;

        let result: Result<(), crate::error::WorkerError> = async {
            let balance = ctx.wallet.get_balance(&escrow_address).await?;
            if balance < deal.amount.to_nano() {
                return Ok(());
            }

            ctx.engine
                .transition(deal.id, DealStatus::Funded, None, json!({ "balance_nano": balance }))
                .await?;
            ctx.notifier.notify(DealStatusChanged {
                deal_id: deal.id,
                old_status: DealStatus::PendingPayment,
                new_status: DealStatus::Funded,
                at: now(),
            });

            let tx = Transaction {
                id: ctx.store.next_transaction_id()?,
                deal_id: deal.id,
                tx_type: TransactionType::Deposit,
                amount: deal.amount,
                source_address: None,
                dest_address: Some(escrow_address.clone()),
                chain_tx_id: None,
                confirmed_at: Some(now()),
            };
            ctx.store.put_transaction(&tx)?;

            ctx.engine
                .transition(deal.id, DealStatus::CreativePending, None, json!({}))
                .await?;
            ctx.notifier.notify(DealStatusChanged {
                deal_id: deal.id,
                old_status: DealStatus::Funded,
                new_status: DealStatus::CreativePending,
                at: now(),
            });

            info!(deal_id = %deal.id, balance_nano = balance, "deal funded");
            Ok(())
        }
        .await;

        match result {
            Ok(()) => report.record_success(),
            Err(e) => {
                warn!(deal_id = %deal.id, error = %e, "payment detector: deal failed");
                report.record_failure();
            }
        }
    }

    report
}

//! Purge & receipt.
//!
//! Daily: for each Deal completed more than `purge_retention_days` ago
//! with no receipt yet, compute the canonical deal hash over the fields
//! about to be purged, write the immutable `DealReceipt`, then null out
//! the sensitive columns. One focused function acting transactionally
//! across a small set of rows for a single entity.

use std::collections::BTreeMap;

use advault_core::entities::DealReceipt;
use advault_core::time::now;
use advault_crypto::hash_deal_data;
use serde_json::json;
use tracing::{info, warn};

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn purge_completed_deals(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();
    let cutoff = now() - ctx.purge_retention_days * 86_400;

    let deals = match ctx.store.iter_all_deals() {
        Ok(deals) => deals,
        Err(e) => {
            warn!(error = %e, "purge worker: failed to list deals");
            report.record_failure();
            return report;
        }
    };

    for mut deal in deals {
        let Some(completed_at) = deal.completed_at else { continue };
        if completed_at >= cutoff {
            continue;
        }
        match ctx.store.get_receipt(deal.id) {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                warn!(deal_id = %deal.id, error = %e, "purge worker: receipt lookup failed");
                report.record_failure();
                continue;
            }
        }

        let _guard = ctx.locks.acquire(&format!("purge:{}", deal.id)).await;

        let result: Result<(), crate::error::WorkerError> = (|| {
            let completed_iso = chrono::DateTime::from_timestamp(completed_at, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default();

            let mut fields = BTreeMap::new();
            fields.insert("id".to_string(), json!(deal.id.get()));
            fields.insert("channel_id".to_string(), json!(deal.channel_id.get()));
            fields.insert("advertiser_id".to_string(), json!(deal.advertiser_id.get()));
            fields.insert("amount".to_string(), json!(deal.amount.to_nano().to_string()));
            fields.insert("final_status".to_string(), json!(format!("{:?}", deal.status)));
            fields.insert("escrow_address".to_string(), json!(deal.escrow_address));
            fields.insert("completed_at".to_string(), json!(completed_iso));

            let data_hash = hash_deal_data(&fields)?;

            let channel_title = ctx
                .store
                .get_channel(deal.channel_id)?
                .map(|c| c.title)
                .unwrap_or_default();

            let receipt = DealReceipt {
                deal_id: deal.id,
                channel_title,
                owner_alias: deal.owner_alias.clone(),
                advertiser_alias: deal.advertiser_alias.clone(),
                amount: deal.amount,
                final_status: deal.status,
                completed_at,
                data_hash,
                purged_at: now(),
            };
            ctx.store.put_receipt(&receipt)?;
            ctx.store.purge_deal_fields(&mut deal)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                info!(deal_id = %deal.id, "deal purged, receipt written");
                report.record_success();
            }
            Err(e) => {
                warn!(deal_id = %deal.id, error = %e, "purge worker: deal failed");
                report.record_failure();
            }
        }
    }

    report
}

//! Saga recovery.
//!
//! Every ~5 min: retries hop 2 of any `PendingTransfer` whose hop 1
//! already landed on chain but whose hop 2 hasn't, within its retry
//! budget — `advault_saga::EscrowSaga::retry_hop2` never re-submits
//! hop 1, so this is safe to run as often as the scheduler likes.

use tracing::warn;

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn recover_pending_transfers(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();

    let eligible = match ctx.store.iter_retry_eligible_transfers() {
        Ok(transfers) => transfers,
        Err(e) => {
            warn!(error = %e, "saga recovery: failed to list retry-eligible transfers");
            report.record_failure();
            return report;
        }
    };

    for transfer in eligible {
        let _guard = ctx.locks.acquire(&format!("saga-recovery:{}", transfer.id)).await;
        match ctx.saga.retry_hop2(transfer.id).await {
            Ok(_) => report.record_success(),
            Err(e) => {
                warn!(transfer_id = %transfer.id, deal_id = %transfer.deal_id, error = %e, "saga recovery: hop 2 retry failed");
                report.record_failure();
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use advault_chain::{EscrowWallet, MockChainClient};
    use advault_core::entities::{Deal, User};
    use advault_core::money::{Money, NANO_SCALE};
    use advault_core::types::{AdFormatId, Alias, ChannelId, DealStatus, Role, UserId};
    use advault_crypto::FieldCipher;
    use advault_dispute::DisputeProtocol;
    use advault_engine::{DealEngine, RequirementEvaluator};
    use advault_notify::LoggingSink;
    use advault_platform::AdapterRegistry;
    use advault_saga::EscrowSaga;
    use advault_store::{DealLocks, LedgerStore};

    use super::*;
    use crate::lock::InProcessLock;

    #[tokio::test(start_paused = true)]
    async fn retries_a_stuck_hop2_and_completes_the_deal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        let engine = Arc::new(DealEngine::new(store.clone(), locks));
        let cipher = FieldCipher::new([5u8; 32]);
        let chain = Arc::new(MockChainClient::new());
        let master = advault_chain::wallet::MasterWallet { address: "master".into(), key: "master-key".into() };
        let wallet = Arc::new(EscrowWallet::new(chain.clone(), cipher, Some(master)));
        let saga = Arc::new(EscrowSaga::new(engine.clone(), wallet.clone(), 500));
        let evaluator = Arc::new(RequirementEvaluator::new(store.clone()));
        let dispute = Arc::new(DisputeProtocol::new(engine.clone(), saga.clone()));

        let owner_id = store.next_user_id().unwrap();
        store
            .put_user(&User { id: owner_id, external_id: "owner-ext".into(), display_handle: None, role: Role::CreatorOnly, payout_wallet: Some("owner_wallet".into()), created_at: 0 })
            .unwrap();
        let advertiser_id = store.next_user_id().unwrap();
        store
            .put_user(&User { id: advertiser_id, external_id: "adv-ext".into(), display_handle: None, role: Role::AdvertiserOnly, payout_wallet: Some("adv_wallet".into()), created_at: 0 })
            .unwrap();

        let generated = wallet.generate_wallet().unwrap();
        chain.fund(&generated.address, 100 * NANO_SCALE as i128);

        let deal_id = store.next_deal_id().unwrap();
        store
            .put_deal(&Deal {
                id: deal_id,
                channel_id: ChannelId::new(1),
                owner_id,
                advertiser_id,
                ad_format_id: AdFormatId::new(1),
                status: DealStatus::Verified,
                amount: Money::from_decimal_str("50.0").unwrap(),
                owner_alias: Alias("Seller-aaaa".into()),
                advertiser_alias: Alias("Buyer-bbbb".into()),
                escrow_address: Some(generated.address),
                escrow_encrypted_key: Some(generated.encrypted_mnemonic),
                timeout_at: None,
                verification_window_hours: 24,
                tracking_started_at: Some(0),
                posted_platform_id: None,
                post_proof_url: None,
                content_hash: None,
                completed_at: None,
                created_at: 0,
                updated_at: 0,
            })
            .unwrap();

        chain.fail_next_sends("master-key", 1);
        saga.release_funds(deal_id).await.unwrap_err();

        let ctx = WorkerContext {
            store: store.clone(),
            engine,
            evaluator,
            saga,
            dispute,
            wallet,
            adapters: Arc::new(AdapterRegistry::new()),
            notifier: Arc::new(LoggingSink),
            locks: Arc::new(InProcessLock::new()),
            purge_retention_days: 30,
            stats_refresh_batch_size: 50,
        };

        let report = recover_pending_transfers(&ctx).await;
        assert_eq!(report.items_processed, 1);
        assert_eq!(report.items_failed, 0);

        let deal = store.require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Completed);
    }

    #[tokio::test]
    async fn no_eligible_transfers_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        let engine = Arc::new(DealEngine::new(store.clone(), locks));
        let cipher = FieldCipher::new([6u8; 32]);
        let chain = Arc::new(MockChainClient::new());
        let wallet = Arc::new(EscrowWallet::new(chain, cipher, None));
        let saga = Arc::new(EscrowSaga::new(engine.clone(), wallet.clone(), 500));
        let evaluator = Arc::new(RequirementEvaluator::new(store.clone()));
        let dispute = Arc::new(DisputeProtocol::new(engine.clone(), saga.clone()));

        let ctx = WorkerContext {
            store,
            engine,
            evaluator,
            saga,
            dispute,
            wallet,
            adapters: Arc::new(AdapterRegistry::new()),
            notifier: Arc::new(LoggingSink),
            locks: Arc::new(InProcessLock::new()),
            purge_retention_days: 30,
            stats_refresh_batch_size: 50,
        };

        let report = recover_pending_transfers(&ctx).await;
        assert_eq!(report.items_processed, 0);
        assert_eq!(report.items_failed, 0);
    }
}

//! Metric tracker.
//!
//! Every ~5–15 min per deal: for each Deal in `Tracking` with a posted
//! proof URL, fetch current engagement metrics from the platform
//! adapter and run them through the requirement evaluator. All
//! requirements met transitions the deal to `Verified` and immediately
//! releases escrow; the verification window elapsing without all
//! requirements met transitions it to `Failed` instead.
//!
//! If the adapter reports a `content_hash` that no longer matches the
//! one stamped at `submit_post_proof` time, the post has been edited
//! since tracking started: the fetched metrics are treated as
//! `PostExists = false` for this pass, so no requirement can latch
//! `Met` on stale engagement numbers.

use advault_core::time::now;
use advault_core::types::DealStatus;
use advault_notify::DealStatusChanged;
use serde_json::json;
use tracing::{info, warn};

use crate::context::WorkerContext;
use crate::report::WorkerReport;

pub async fn track_metrics(ctx: &WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();

    let tracking = match ctx.store.iter_deals_with_status(DealStatus::Tracking) {
        Ok(deals) => deals,
        Err(e) => {
            warn!(error = %e, "metric tracker: failed to list tracking deals");
            report.record_failure();
            return report;
        }
    };

    for deal in tracking {
        let Some(post_url) = deal.post_proof_url.clone() else {
            continue;
        };
        let _guard = ctx.locks.acquire(&format!("metric-tracker:{}", deal.id)).await;

        let result: Result<(), crate::error::WorkerError> = async {
            let channel = ctx.store.get_channel(deal.channel_id)?;
            let Some(channel) = channel else { return Ok(()) };
            let adapter = ctx.adapters.get(&channel.platform)?;
            let mut metrics = adapter.fetch_post_metrics(&post_url).await?;

            if let (Some(seen), Some(stamped)) = (&metrics.content_hash, &deal.content_hash) {
                if seen != stamped {
                    warn!(deal_id = %deal.id, "post content hash changed since submission, treating as absent");
                    metrics = advault_platform::PostMetrics {
                        exists: false,
                        content_hash: metrics.content_hash,
                        ..Default::default()
                    };
                }
            }

            let evaluation = ctx.evaluator.evaluate(deal.id, &metrics)?;

            if evaluation.all_met {
                ctx.engine
                    .transition(deal.id, DealStatus::Verified, None, json!({ "source": "metric_tracker" }))
                    .await?;
                ctx.notifier.notify(DealStatusChanged {
                    deal_id: deal.id,
                    old_status: DealStatus::Tracking,
                    new_status: DealStatus::Verified,
                    at: now(),
                });
                ctx.saga.release_funds(deal.id).await?;
                ctx.notifier.notify(DealStatusChanged {
                    deal_id: deal.id,
                    old_status: DealStatus::Verified,
                    new_status: DealStatus::Completed,
                    at: now(),
                });
                info!(deal_id = %deal.id, "requirements met, escrow released");
                return Ok(());
            }

            let window_elapsed = deal
                .tracking_started_at
                .map(|started| started + deal.verification_window_hours as i64 * 3600 < now())
                .unwrap_or(false);
            if window_elapsed {
                ctx.engine
                    .transition(deal.id, DealStatus::Failed, None, json!({ "reason": "verification window elapsed" }))
                    .await?;
                ctx.notifier.notify(DealStatusChanged {
                    deal_id: deal.id,
                    old_status: DealStatus::Tracking,
                    new_status: DealStatus::Failed,
                    at: now(),
                });
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => report.record_success(),
            Err(e) => {
                warn!(deal_id = %deal.id, error = %e, "metric tracker: deal failed");
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
    use advault_core::entities::{Deal, DealRequirement, User};
    use advault_core::money::Money;
    use advault_core::types::{
        AdFormatId, Alias, ChannelId, DealId, MetricType, PlatformTag, RequirementStatus, Role, UserId,
    };
    use advault_crypto::FieldCipher;
    use advault_dispute::DisputeProtocol;
    use advault_engine::{DealEngine, RequirementEvaluator};
    use advault_notify::LoggingSink;
    use advault_platform::mock::MockPlatformAdapter;
    use advault_platform::{AdapterRegistry, PostMetrics};
    use advault_saga::EscrowSaga;
    use advault_store::{DealLocks, LedgerStore};

    use super::*;
    use crate::lock::InProcessLock;

    fn harness() -> (WorkerContext, Arc<LedgerStore>, Arc<MockPlatformAdapter>, Arc<MockChainClient>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        let engine = Arc::new(DealEngine::new(store.clone(), locks));
        let cipher = FieldCipher::new([9u8; 32]);
        let chain = Arc::new(MockChainClient::new());
        let wallet = Arc::new(EscrowWallet::new(chain.clone(), cipher, None));
        let saga = Arc::new(EscrowSaga::new(engine.clone(), wallet.clone(), 500));
        let evaluator = Arc::new(RequirementEvaluator::new(store.clone()));
        let dispute = Arc::new(DisputeProtocol::new(engine.clone(), saga.clone()));

        let adapter = Arc::new(MockPlatformAdapter::new(PlatformTag::Telegram));
        let mut registry = AdapterRegistry::new();
        registry.register(PlatformTag::Telegram, adapter.clone());

        let ctx = WorkerContext {
            store: store.clone(),
            engine,
            evaluator,
            saga,
            dispute,
            wallet,
            adapters: Arc::new(registry),
            notifier: Arc::new(LoggingSink),
            locks: Arc::new(InProcessLock::new()),
            purge_retention_days: 30,
            stats_refresh_batch_size: 50,
        };
        (ctx, store, adapter, chain, dir)
    }

    fn make_tracking_deal(store: &LedgerStore, post_url: &str, escrow_address: &str, owner_payout: &str) -> DealId {
        store
            .put_channel(&advault_core::entities::Channel {
                id: ChannelId::new(1),
                owner_id: UserId::new(1),
                platform: PlatformTag::Telegram,
                platform_channel_id: "chan1".into(),
                title: "Test Channel".into(),
                stats: Default::default(),
                verified: true,
                verified_at: Some(0),
                verification_token: None,
                created_at: 0,
                stats_refreshed_at: None,
            })
            .unwrap();

        let owner_id = store.next_user_id().unwrap();
        store
            .put_user(&User {
                id: owner_id,
                external_id: "owner-ext".into(),
                display_handle: None,
                role: Role::CreatorOnly,
                payout_wallet: Some(owner_payout.to_string()),
                created_at: 0,
            })
            .unwrap();

        let id = store.next_deal_id().unwrap();
        store
            .put_deal(&Deal {
                id,
                channel_id: ChannelId::new(1),
                owner_id,
                advertiser_id: UserId::new(2),
                ad_format_id: AdFormatId::new(1),
                status: DealStatus::Tracking,
                amount: Money::from_decimal_str("20.0").unwrap(),
                owner_alias: Alias("Seller-aaaa".into()),
                advertiser_alias: Alias("Buyer-bbbb".into()),
                escrow_address: Some(escrow_address.to_string()),
                escrow_encrypted_key: Some("enc".into()),
                timeout_at: None,
                verification_window_hours: 24,
                tracking_started_at: Some(now() - 3600),
                posted_platform_id: Some("post-1".into()),
                post_proof_url: Some(post_url.to_string()),
                content_hash: None,
                completed_at: None,
                created_at: 0,
                updated_at: 0,
            })
            .unwrap();

        let req_id = store.next_requirement_id().unwrap();
        store
            .put_requirement(&DealRequirement {
                id: req_id,
                deal_id: id,
                metric_type: MetricType::Views,
                target_value: 100,
                current_value: 0,
                status: RequirementStatus::Pending,
                last_checked_at: None,
                met_at: None,
            })
            .unwrap();

        id
    }

    #[tokio::test(start_paused = true)]
    async fn requirements_met_releases_escrow() {
        let (ctx, store, adapter, chain, _dir) = harness();
        let deal_id = make_tracking_deal(&store, "https://mock/chan1/1", "escrow1", "owner_wallet");
        chain.fund("escrow1", 20 * advault_core::money::NANO_SCALE as i128);
        adapter.set_metrics("https://mock/chan1/1", PostMetrics { exists: true, views: Some(500), ..Default::default() });

        let report = track_metrics(&ctx).await;
        assert_eq!(report.items_processed, 1);
        assert_eq!(report.items_failed, 0);

        let requirements = store.iter_requirements_for_deal(deal_id).unwrap();
        assert_eq!(requirements[0].status, RequirementStatus::Met);

        let deal = store.require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Completed);
        assert_eq!(chain.balance_of("owner_wallet"), 19_000_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn unmet_requirements_before_window_elapses_leave_deal_tracking() {
        let (ctx, store, adapter, _chain, _dir) = harness();
        let deal_id = make_tracking_deal(&store, "https://mock/chan1/2", "escrow2", "owner_wallet2");
        adapter.set_metrics("https://mock/chan1/2", PostMetrics { exists: true, views: Some(10), ..Default::default() });

        let report = track_metrics(&ctx).await;
        assert_eq!(report.items_processed, 1);
        assert_eq!(report.items_failed, 0);

        let deal = store.require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn content_hash_mismatch_is_treated_as_post_absent() {
        let (ctx, store, adapter, _chain, _dir) = harness();
        let deal_id = make_tracking_deal(&store, "https://mock/chan1/4", "escrow4", "owner_wallet4");

        let mut deal = store.require_deal(deal_id).unwrap();
        deal.content_hash = Some("original-hash".into());
        store.put_deal(&deal).unwrap();

        adapter.set_metrics(
            "https://mock/chan1/4",
            PostMetrics {
                exists: true,
                views: Some(500),
                content_hash: Some("edited-hash".into()),
                ..Default::default()
            },
        );

        let report = track_metrics(&ctx).await;
        assert_eq!(report.items_processed, 1);
        assert_eq!(report.items_failed, 0);

        let requirements = store.iter_requirements_for_deal(deal_id).unwrap();
        assert_eq!(requirements[0].status, RequirementStatus::Pending);

        let deal = store.require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn window_elapsed_without_all_met_fails_the_deal() {
        let (ctx, store, adapter, _chain, _dir) = harness();
        let deal_id = make_tracking_deal(&store, "https://mock/chan1/3", "escrow3", "owner_wallet3");
        adapter.set_metrics("https://mock/chan1/3", PostMetrics { exists: true, views: Some(10), ..Default::default() });

        let mut deal = store.require_deal(deal_id).unwrap();
        deal.tracking_started_at = Some(now() - 1000 * 3600);
        deal.verification_window_hours = 24;
        store.put_deal(&deal).unwrap();

        let report = track_metrics(&ctx).await;
        assert_eq!(report.items_processed, 1);

        let deal = store.require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Failed);
    }
}

//! Deal state machine.
//!
//! A struct holding an `Arc<LedgerStore>`, one public method per
//! operation, each acquiring the deal lock, validating, mutating, and
//! committing inside one critical section, with a matching `DealEvent`
//! inserted in the same section.

use std::sync::Arc;

use advault_core::constants::soft_timeout_hours;
use advault_core::entities::{Deal, DealEvent};
use advault_core::time::now;
use advault_core::types::{DealId, DealStatus, UserId};
use advault_store::{DealLocks, LedgerStore};
use serde_json::Value;

use crate::error::EngineError;

/// Legal next states for `status` (transition table).
pub fn allowed_transitions(status: DealStatus) -> &'static [DealStatus] {
    use DealStatus::*;
    match status {
        PendingPayment => &[Funded, Cancelled, TimedOut],
        Funded => &[CreativePending, Cancelled, Refunded, Disputed, TimedOut],
        CreativePending => &[CreativeSubmitted, Cancelled, Refunded, Disputed, TimedOut],
        CreativeSubmitted => &[CreativeApproved, CreativeRevision, Cancelled, Refunded, Disputed, TimedOut],
        CreativeRevision => &[CreativeSubmitted, Cancelled, Refunded, Disputed, TimedOut],
        CreativeApproved => &[Posted, Cancelled, Refunded, Disputed, TimedOut],
        Posted => &[Tracking, Disputed, TimedOut],
        Tracking => &[Verified, Failed, Disputed, TimedOut],
        Verified => &[Completed],
        Failed => &[Refunded, Disputed],
        Disputed => &[Refunded, Completed],
        TimedOut => &[Refunded],
        Completed | Cancelled | Refunded => &[],
    }
}

/// States that stamp `completed_at` on entry — a wider set than
/// [`DealStatus::is_terminal`], which only covers states with zero
/// outgoing edges.
fn stamps_completed_at(status: DealStatus) -> bool {
    matches!(
        status,
        DealStatus::Completed | DealStatus::Cancelled | DealStatus::Refunded | DealStatus::Failed | DealStatus::TimedOut
    )
}

pub struct DealEngine {
    store: Arc<LedgerStore>,
    locks: Arc<DealLocks>,
}

impl DealEngine {
    pub fn new(store: Arc<LedgerStore>, locks: Arc<DealLocks>) -> Self {
        Self { store, locks }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn locks(&self) -> &Arc<DealLocks> {
        &self.locks
    }

    /// `transitionDeal(id, target, actor?, metadata?)`.
    pub async fn transition(
        &self,
        deal_id: DealId,
        target: DealStatus,
        actor: Option<UserId>,
        metadata: Value,
    ) -> Result<Deal, EngineError> {
        let _guard = self.locks.lock(deal_id).await;
        let mut deal = self.store.require_deal(deal_id)?;
        let current = deal.status;

        if !allowed_transitions(current).contains(&target) {
            return Err(EngineError::InvalidTransition { from: current, to: target });
        }

        let now_ts = now();
        deal.timeout_at = soft_timeout_hours(target).map(|hours| now_ts + hours * 3600);
        if stamps_completed_at(target) {
            deal.completed_at = Some(now_ts);
        }
        deal.status = target;
        deal.updated_at = now_ts;
        self.store.put_deal(&deal)?;

        let event = DealEvent {
            id: self.store.next_event_id()?,
            deal_id,
            event_type: "status_changed".to_string(),
            old_status: Some(current),
            new_status: Some(target),
            actor_id: actor,
            metadata,
            created_at: now_ts,
        };
        self.store.put_event(&event)?;

        Ok(deal)
    }
}

#[cfg(test)]
mod tests {
    use advault_core::entities::Deal;
    use advault_core::money::Money;
    use advault_core::types::{AdFormatId, Alias, ChannelId, UserId};
    use advault_store::LedgerStore;

    use super::*;

    fn make_deal(store: &LedgerStore) -> DealId {
        let id = store.next_deal_id().unwrap();
        let deal = Deal {
            id,
            channel_id: ChannelId::new(1),
            owner_id: UserId::new(1),
            advertiser_id: UserId::new(2),
            ad_format_id: AdFormatId::new(1),
            status: DealStatus::PendingPayment,
            amount: Money::from_decimal_str("50.0").unwrap(),
            owner_alias: Alias("Seller-aaaa".into()),
            advertiser_alias: Alias("Buyer-bbbb".into()),
            escrow_address: None,
            escrow_encrypted_key: None,
            timeout_at: None,
            verification_window_hours: 72,
            tracking_started_at: None,
            posted_platform_id: None,
            post_proof_url: None,
            content_hash: None,
            completed_at: None,
            created_at: 0,
            updated_at: 0,
        };
        store.put_deal(&deal).unwrap();
        id
    }

    fn engine() -> (DealEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        (DealEngine::new(store, locks), dir)
    }

    #[tokio::test]
    async fn happy_path_first_hop_sets_funded_and_timeout() {
        let (engine, _dir) = engine();
        let deal_id = make_deal(&engine.store);
        let deal = engine
            .transition(deal_id, DealStatus::Funded, None, serde_json::Value::Null)
            .await
            .unwrap();
        assert_eq!(deal.status, DealStatus::Funded);
        assert!(deal.timeout_at.is_some());
        assert!(deal.completed_at.is_none());

        let events = engine.store.iter_events_for_deal(deal_id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].old_status, Some(DealStatus::PendingPayment));
        assert_eq!(events[0].new_status, Some(DealStatus::Funded));
    }

    #[tokio::test]
    async fn disallowed_transition_is_rejected() {
        let (engine, _dir) = engine();
        let deal_id = make_deal(&engine.store);
        let err = engine
            .transition(deal_id, DealStatus::Completed, None, serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn terminal_transition_stamps_completed_at_and_clears_timeout() {
        let (engine, _dir) = engine();
        let deal_id = make_deal(&engine.store);
        let deal = engine
            .transition(deal_id, DealStatus::Cancelled, None, serde_json::Value::Null)
            .await
            .unwrap();
        assert!(deal.completed_at.is_some());
        assert!(deal.timeout_at.is_none());
    }

    #[tokio::test]
    async fn re_advancing_an_already_advanced_deal_fails() {
        let (engine, _dir) = engine();
        let deal_id = make_deal(&engine.store);
        engine
            .transition(deal_id, DealStatus::Funded, None, serde_json::Value::Null)
            .await
            .unwrap();
        // Second caller still thinks it's PendingPayment -> Funded; but the
        // deal is already Funded, so Funded is no longer an allowed target.
        let err = engine
            .transition(deal_id, DealStatus::Funded, None, serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(engine.store.iter_events_for_deal(deal_id).unwrap().len(), 1);
    }
}

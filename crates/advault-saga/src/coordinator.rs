//! Escrow saga coordinator.
//!
//! Privacy requires a two-hop relay: escrow address → master wallet →
//! payee, so a specific escrow can never be linked on-chain to a
//! specific payee (every payout appears to originate from the same
//! master wallet). `PendingTransfer` is the saga's continuation record:
//! hop 1 (escrow → master) is a sunk cost once it lands on chain, hop 2
//! (master → payee) is the retry point, picked up by the recovery
//! worker (`advault-workers::recovery`) on crash or transient failure.

use std::sync::Arc;

use advault_core::constants::SAGA_MAX_RETRIES;
use advault_core::entities::{PendingTransfer, Transaction};
use advault_core::time::now;
use advault_core::types::{DealId, DealStatus, PendingTransferId, SagaType, TransactionType};
use advault_chain::EscrowWallet;
use advault_engine::DealEngine;
use advault_store::LedgerStore;
use serde_json::json;
use tracing::{info, warn};

use crate::error::SagaError;

pub struct EscrowSaga {
    engine: Arc<DealEngine>,
    wallet: Arc<EscrowWallet>,
    platform_fee_bps: u32,
}

impl EscrowSaga {
    pub fn new(engine: Arc<DealEngine>, wallet: Arc<EscrowWallet>, platform_fee_bps: u32) -> Self {
        Self { engine, wallet, platform_fee_bps }
    }

    fn store(&self) -> &Arc<LedgerStore> {
        self.engine.store()
    }

    /// `releaseFunds(dealId)`: pays the channel owner, minus the
    /// platform fee, and transitions the deal to `Completed`.
    pub async fn release_funds(&self, deal_id: DealId) -> Result<PendingTransfer, SagaError> {
        let deal = self.store().require_deal(deal_id).map_err(|_| SagaError::DealNotFound(deal_id))?;
        let owner = self
            .store()
            .get_user(deal.owner_id)?
            .ok_or(SagaError::DealNotFound(deal_id))?;
        let recipient = owner.payout_wallet.ok_or(SagaError::NoPayoutWallet(deal_id, "owner"))?;
        let (_fee, payout) = deal.amount.subtract_fee(self.platform_fee_bps);

        self.run_saga(deal_id, SagaType::Release, recipient, payout, deal.amount, DealStatus::Completed, TransactionType::Release)
            .await
    }

    /// `refundFunds(dealId)`: returns the full deposited amount to the
    /// advertiser (no fee) and transitions the deal to `Refunded`.
    pub async fn refund_funds(&self, deal_id: DealId) -> Result<PendingTransfer, SagaError> {
        let deal = self.store().require_deal(deal_id).map_err(|_| SagaError::DealNotFound(deal_id))?;
        let advertiser = self
            .store()
            .get_user(deal.advertiser_id)?
            .ok_or(SagaError::DealNotFound(deal_id))?;
        let recipient = advertiser.payout_wallet.ok_or(SagaError::NoPayoutWallet(deal_id, "advertiser"))?;

        self.run_saga(deal_id, SagaType::Refund, recipient, deal.amount, deal.amount, DealStatus::Refunded, TransactionType::Refund)
            .await
    }

    /// Shared release/refund protocol: insert the `PendingTransfer`
    /// record, run hop 1 (escrow → master), then hop 2 (master →
    /// payee). On hop-2 failure the error is propagated to the caller
    /// (the first attempt); the recovery worker owns retries after that.
    async fn run_saga(
        &self,
        deal_id: DealId,
        saga_type: SagaType,
        recipient: String,
        payout: advault_core::money::Money,
        hop1_amount: advault_core::money::Money,
        terminal_state: DealStatus,
        tx_type: TransactionType,
    ) -> Result<PendingTransfer, SagaError> {
        let deal = self.store().require_deal(deal_id).map_err(|_| SagaError::DealNotFound(deal_id))?;
        let escrow_address = deal.escrow_address.clone().ok_or(SagaError::NoEscrowWallet(deal_id))?;
        let escrow_key = deal.escrow_encrypted_key.clone().ok_or(SagaError::NoEscrowWallet(deal_id))?;

        let mut transfer = PendingTransfer {
            id: self.store().next_pending_transfer_id()?,
            deal_id,
            saga_type,
            recipient_address: recipient.clone(),
            amount: payout,
            hop1_tx_id: None,
            hop2_tx_id: None,
            retry_count: 0,
            last_error: None,
            completed_at: None,
            created_at: now(),
        };
        self.store().put_pending_transfer(&transfer)?;

        match self.wallet.master_address() {
            Some(master) => {
                let master = master.to_string();
                let hop1_tx = self.wallet.transfer_funds(&escrow_key, &escrow_address, &master, hop1_amount.to_nano()).await?;
                transfer.hop1_tx_id = Some(hop1_tx);
                self.store().put_pending_transfer(&transfer)?;
                info!(deal_id = %deal_id, ?saga_type, "saga hop 1 confirmed");

                match self.wallet.transfer_from_master(&recipient, payout.to_nano()).await {
                    Ok(hop2_tx) => {
                        self.complete(&mut transfer, hop2_tx, &master, &recipient, payout, tx_type, deal_id, terminal_state).await?;
                    }
                    Err(e) => {
                        transfer.last_error = Some(e.to_string());
                        transfer.retry_count += 1;
                        self.store().put_pending_transfer(&transfer)?;
                        warn!(deal_id = %deal_id, error = %e, "saga hop 2 failed, left for recovery");
                        return Err(e.into());
                    }
                }
            }
            None => {
                // No master wallet configured: fall back to a direct
                // single-hop transfer, acceptable for dev only.
                let tx = self.wallet.transfer_funds(&escrow_key, &escrow_address, &recipient, payout.to_nano()).await?;
                transfer.hop1_tx_id = Some(tx.clone());
                self.complete(&mut transfer, tx, &escrow_address, &recipient, payout, tx_type, deal_id, terminal_state).await?;
            }
        }

        Ok(transfer)
    }

    /// Finishes a saga once hop 2 (or the single-hop fallback) has a
    /// confirmed tx id: stamps the transfer, records the `Transaction`,
    /// and drives the deal to its terminal state.
    #[allow(clippy::too_many_arguments)]
    async fn complete(
        &self,
        transfer: &mut PendingTransfer,
        hop2_tx: String,
        source: &str,
        dest: &str,
        amount: advault_core::money::Money,
        tx_type: TransactionType,
        deal_id: DealId,
        terminal_state: DealStatus,
    ) -> Result<(), SagaError> {
        transfer.hop2_tx_id = Some(hop2_tx.clone());
        transfer.completed_at = Some(now());
        self.store().put_pending_transfer(transfer)?;

        let tx = Transaction {
            id: self.store().next_transaction_id()?,
            deal_id,
            tx_type,
            amount,
            source_address: Some(source.to_string()),
            dest_address: Some(dest.to_string()),
            chain_tx_id: Some(hop2_tx),
            confirmed_at: Some(now()),
        };
        self.store().put_transaction(&tx)?;

        self.engine.transition(deal_id, terminal_state, None, json!({ "saga": "settled" })).await?;
        info!(deal_id = %deal_id, ?terminal_state, "saga settled");
        Ok(())
    }

    /// Recovery worker entry point: retries hop 2 only for a
    /// `PendingTransfer` whose hop 1 already landed on chain. Re-submitting
    /// hop 1 would double-pay, so this never touches it.
    pub async fn retry_hop2(&self, transfer_id: PendingTransferId) -> Result<PendingTransfer, SagaError> {
        let mut transfer = self
            .store()
            .get_pending_transfer(transfer_id)?
            .ok_or(SagaError::TransferNotFound(transfer_id))?;
        if !transfer.retry_eligible() {
            return Err(SagaError::NotRetryEligible(transfer_id));
        }

        let terminal_state = match transfer.saga_type {
            SagaType::Release => DealStatus::Completed,
            SagaType::Refund => DealStatus::Refunded,
        };
        let tx_type = match transfer.saga_type {
            SagaType::Release => TransactionType::Release,
            SagaType::Refund => TransactionType::Refund,
        };

        match self.wallet.transfer_from_master(&transfer.recipient_address, transfer.amount.to_nano()).await {
            Ok(hop2_tx) => {
                let master = self.wallet.master_address().unwrap_or_default().to_string();
                let recipient = transfer.recipient_address.clone();
                let amount = transfer.amount;
                let deal_id = transfer.deal_id;
                self.complete(&mut transfer, hop2_tx, &master, &recipient, amount, tx_type, deal_id, terminal_state).await?;
                Ok(transfer)
            }
            Err(e) => {
                transfer.last_error = Some(e.to_string());
                transfer.retry_count += 1;
                self.store().put_pending_transfer(&transfer)?;
                warn!(
                    deal_id = %transfer.deal_id,
                    retry_count = transfer.retry_count,
                    max = SAGA_MAX_RETRIES,
                    error = %e,
                    "saga hop 2 recovery attempt failed"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use advault_chain::{EscrowWallet, MockChainClient};
    use advault_core::entities::{Deal, User};
    use advault_core::money::Money;
    use advault_core::types::{AdFormatId, Alias, ChannelId, Role, UserId};
    use advault_crypto::FieldCipher;
    use advault_store::{DealLocks, LedgerStore};

    use super::*;

    struct Harness {
        saga: EscrowSaga,
        store: Arc<LedgerStore>,
        chain: Arc<MockChainClient>,
        deal_id: DealId,
        _dir: tempfile::TempDir,
    }

    fn harness(with_master: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        let engine = Arc::new(DealEngine::new(store.clone(), locks));
        let cipher = FieldCipher::new([1u8; 32]);
        let chain = Arc::new(MockChainClient::new());

        let master = if with_master {
            Some(advault_chain::wallet::MasterWallet { address: "master".into(), key: "master-key".into() })
        } else {
            None
        };
        let wallet = Arc::new(EscrowWallet::new(chain.clone(), cipher, master));

        let owner_id = store.next_user_id().unwrap();
        store
            .put_user(&User { id: owner_id, external_id: "owner-ext".into(), display_handle: None, role: Role::CreatorOnly, payout_wallet: Some("owner_wallet".into()), created_at: 0 })
            .unwrap();
        let advertiser_id = store.next_user_id().unwrap();
        store
            .put_user(&User {
                id: advertiser_id,
                external_id: "adv-ext".into(),
                display_handle: None,
                role: Role::AdvertiserOnly,
                payout_wallet: Some("advertiser_wallet".into()),
                created_at: 0,
            })
            .unwrap();

        let generated = wallet.generate_wallet().unwrap();
        chain.fund(&generated.address, 100 * advault_core::money::NANO_SCALE as i128);

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

        let saga = EscrowSaga::new(engine, wallet, 500); // 5%
        Harness { saga, store, chain, deal_id, _dir: dir }
    }

    #[tokio::test(start_paused = true)]
    async fn release_pays_owner_minus_fee_and_completes_the_deal() {
        let h = harness(true);
        let transfer = h.saga.release_funds(h.deal_id).await.unwrap();
        assert!(transfer.invariant_holds());
        assert!(transfer.hop1_tx_id.is_some());
        assert!(transfer.hop2_tx_id.is_some());

        let deal = h.store.require_deal(h.deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Completed);
        assert_eq!(h.chain.balance_of("owner_wallet"), 47_500_000_000);

        let txs = h.store.iter_transactions_for_deal(h.deal_id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].tx_type, TransactionType::Release);
    }

    #[tokio::test(start_paused = true)]
    async fn refund_returns_full_amount_to_advertiser() {
        let h = harness(true);
        let transfer = h.saga.refund_funds(h.deal_id).await.unwrap();
        assert!(transfer.invariant_holds());
        let deal = h.store.require_deal(h.deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Refunded);
        assert_eq!(h.chain.balance_of("advertiser_wallet"), 50_000_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn hop2_failure_leaves_a_retry_eligible_transfer() {
        let h = harness(true);
        h.chain.fail_next_sends("master-key", 1);
        let err = h.saga.release_funds(h.deal_id).await.unwrap_err();
        assert!(matches!(err, SagaError::Chain(_)));

        let transfers = h.store.iter_pending_transfers_for_deal(h.deal_id).unwrap();
        assert_eq!(transfers.len(), 1);
        assert!(transfers[0].hop1_tx_id.is_some());
        assert!(transfers[0].hop2_tx_id.is_none());
        assert!(transfers[0].retry_eligible());

        let deal = h.store.require_deal(h.deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Verified, "deal stays put until hop 2 lands");
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_retries_hop2_only_and_completes_the_deal() {
        let h = harness(true);
        h.chain.fail_next_sends("master-key", 1);
        h.saga.release_funds(h.deal_id).await.unwrap_err();

        let transfers = h.store.iter_retry_eligible_transfers().unwrap();
        assert_eq!(transfers.len(), 1);
        let transfer = h.saga.retry_hop2(transfers[0].id).await.unwrap();
        assert!(transfer.completed_at.is_some());
        assert_eq!(transfer.retry_count, 1);

        let deal = h.store.require_deal(h.deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn no_master_wallet_falls_back_to_a_single_hop_transfer() {
        let h = harness(false);
        let transfer = h.saga.release_funds(h.deal_id).await.unwrap();
        assert_eq!(transfer.hop1_tx_id, transfer.hop2_tx_id);
        assert_eq!(h.chain.balance_of("owner_wallet"), 47_500_000_000);
    }
}

//! Persistent ledger store.
//!
//! One named sled tree per entity, bincode in/out. No business rule
//! lives here — the store is a narrow boundary around persistence;
//! `advault-engine`/`advault-saga`/`advault-dispute` hold the rules.
//!
//! Named trees:
//! users — UserId be bytes → bincode(User)
//! users_by_external — external_id utf8 bytes → UserId be bytes [index]
//! channels — ChannelId be bytes → bincode(Channel)
//! channels_by_platform — platform+channel_id key → ChannelId be bytes [index]
//! ad_formats — AdFormatId be bytes → bincode(AdFormat)
//! deals — DealId be bytes → bincode(Deal)
//! escrow_addresses — address utf8 bytes → DealId be bytes [index]
//! requirements — RequirementId be bytes → bincode(DealRequirement)
//! creatives — CreativeId be bytes → bincode(Creative)
//! transactions — TransactionId be bytes → bincode(Transaction)
//! pending_transfers — PendingTransferId be bytes → bincode(PendingTransfer)
//! events — EventId be bytes → bincode(DealEvent)
//! receipts — DealId be bytes → bincode(DealReceipt)
//! disputes — DisputeId be bytes → bincode(Dispute)
//! disputes_by_deal — DealId be bytes → DisputeId be bytes [index]
//! dispute_evidence — EvidenceId be bytes → bincode(DisputeEvidence)
//! meta — utf8 key bytes → raw bytes

use std::path::Path;

use advault_core::entities::*;
use advault_core::types::*;

use crate::error::StoreError;

/// The on-disk schema version `advault-store` expects at `open`.
pub const SCHEMA_VERSION: u32 = 1;

pub struct LedgerStore {
    _db: sled::Db,
    users: sled::Tree,
    users_by_external: sled::Tree,
    channels: sled::Tree,
    channels_by_platform: sled::Tree,
    ad_formats: sled::Tree,
    deals: sled::Tree,
    escrow_addresses: sled::Tree,
    requirements: sled::Tree,
    creatives: sled::Tree,
    transactions: sled::Tree,
    pending_transfers: sled::Tree,
    events: sled::Tree,
    receipts: sled::Tree,
    disputes: sled::Tree,
    disputes_by_deal: sled::Tree,
    dispute_evidence: sled::Tree,
    meta: sled::Tree,
}

fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn channel_index_key(platform: &PlatformTag, platform_channel_id: &str) -> Vec<u8> {
    let mut key = platform.to_string().into_bytes();
    key.push(0);
    key.extend_from_slice(platform_channel_id.as_bytes());
    key
}

impl LedgerStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let store = Self {
            users: db.open_tree("users")?,
            users_by_external: db.open_tree("users_by_external")?,
            channels: db.open_tree("channels")?,
            channels_by_platform: db.open_tree("channels_by_platform")?,
            ad_formats: db.open_tree("ad_formats")?,
            deals: db.open_tree("deals")?,
            escrow_addresses: db.open_tree("escrow_addresses")?,
            requirements: db.open_tree("requirements")?,
            creatives: db.open_tree("creatives")?,
            transactions: db.open_tree("transactions")?,
            pending_transfers: db.open_tree("pending_transfers")?,
            events: db.open_tree("events")?,
            receipts: db.open_tree("receipts")?,
            disputes: db.open_tree("disputes")?,
            disputes_by_deal: db.open_tree("disputes_by_deal")?,
            dispute_evidence: db.open_tree("dispute_evidence")?,
            meta: db.open_tree("meta")?,
            _db: db,
        };
        store.assert_schema_version()?;
        Ok(store)
    }

    fn assert_schema_version(&self) -> Result<(), StoreError> {
        match self.get_meta("schema_version")? {
            None => self.put_meta("schema_version", &SCHEMA_VERSION.to_be_bytes()),
            Some(bytes) => {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&bytes[..4]);
                let found = u32::from_be_bytes(arr);
                if found != SCHEMA_VERSION {
                    return Err(StoreError::Storage(format!(
                        "schema version mismatch: on-disk {found}, expected {SCHEMA_VERSION}"
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self._db.flush()?;
        Ok(())
    }

    // ── Meta ─────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta.insert(key.as_bytes(), value)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn next_id(&self, counter_key: &str) -> Result<u64, StoreError> {
        let current = self
            .get_meta(counter_key)?
            .map(|b| {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            })
            .unwrap_or(1);
        self.put_meta(counter_key, &(current + 1).to_be_bytes())?;
        Ok(current)
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn next_user_id(&self) -> Result<UserId, StoreError> {
        Ok(UserId::new(self.next_id("next_user_id")?))
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        get_entity(&self.users, id.get())
    }

    pub fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        match self.users_by_external.get(external_id.as_bytes())? {
            Some(raw) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&raw);
                self.get_user(UserId::new(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_user(&self, user: &User) -> Result<(), StoreError> {
        if let Some(existing) = self.get_user_by_external_id(&user.external_id)? {
            if existing.id != user.id {
                return Err(StoreError::Conflict(format!(
                    "external_id {} already registered to user {}",
                    user.external_id, existing.id
                )));
            }
        }
        self.users_by_external
            .insert(user.external_id.as_bytes(), &id_key(user.id.get())[..])?;
        put_entity(&self.users, user.id.get(), user)
    }

    // ── Channels ─────────────────────────────────────────────────────────

    pub fn next_channel_id(&self) -> Result<ChannelId, StoreError> {
        Ok(ChannelId::new(self.next_id("next_channel_id")?))
    }

    pub fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, StoreError> {
        get_entity(&self.channels, id.get())
    }

    pub fn get_channel_by_platform(
        &self,
        platform: &PlatformTag,
        platform_channel_id: &str,
    ) -> Result<Option<Channel>, StoreError> {
        let key = channel_index_key(platform, platform_channel_id);
        match self.channels_by_platform.get(key)? {
            Some(raw) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&raw);
                self.get_channel(ChannelId::new(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_channel(&self, channel: &Channel) -> Result<(), StoreError> {
        let index_key = channel_index_key(&channel.platform, &channel.platform_channel_id);
        if let Some(existing) = self.channels_by_platform.get(&index_key)? {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&existing);
            if u64::from_be_bytes(arr) != channel.id.get() {
                return Err(StoreError::Conflict(format!(
                    "channel {}/{} already registered",
                    channel.platform, channel.platform_channel_id
                )));
            }
        }
        self.channels_by_platform
            .insert(index_key, &id_key(channel.id.get())[..])?;
        put_entity(&self.channels, channel.id.get(), channel)
    }

    /// Channels due for a stats refresh, capped by the caller.
    pub fn iter_all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        iter_all(&self.channels)
    }

    // ── Ad formats ───────────────────────────────────────────────────────

    pub fn next_ad_format_id(&self) -> Result<AdFormatId, StoreError> {
        Ok(AdFormatId::new(self.next_id("next_ad_format_id")?))
    }

    pub fn get_ad_format(&self, id: AdFormatId) -> Result<Option<AdFormat>, StoreError> {
        get_entity(&self.ad_formats, id.get())
    }

    pub fn put_ad_format(&self, format: &AdFormat) -> Result<(), StoreError> {
        put_entity(&self.ad_formats, format.id.get(), format)
    }

    pub fn iter_ad_formats_for_channel(&self, channel_id: ChannelId) -> Result<Vec<AdFormat>, StoreError> {
        Ok(iter_all::<AdFormat>(&self.ad_formats)?
            .into_iter()
            .filter(|f| f.channel_id == channel_id)
            .collect())
    }

    // ── Deals ────────────────────────────────────────────────────────────

    pub fn next_deal_id(&self) -> Result<DealId, StoreError> {
        Ok(DealId::new(self.next_id("next_deal_id")?))
    }

    pub fn get_deal(&self, id: DealId) -> Result<Option<Deal>, StoreError> {
        get_entity(&self.deals, id.get())
    }

    pub fn require_deal(&self, id: DealId) -> Result<Deal, StoreError> {
        self.get_deal(id)?
            .ok_or_else(|| StoreError::NotFound(format!("deal {id}")))
    }

    /// Persist `deal`. Enforces "escrow_address, once set, is unique
    /// across all non-purged deals".
    pub fn put_deal(&self, deal: &Deal) -> Result<(), StoreError> {
        if let Some(addr) = &deal.escrow_address {
            if let Some(existing) = self.escrow_addresses.get(addr.as_bytes())? {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&existing);
                if u64::from_be_bytes(arr) != deal.id.get() {
                    return Err(StoreError::Conflict(format!(
                        "escrow address {addr} already assigned"
                    )));
                }
            }
            self.escrow_addresses
                .insert(addr.as_bytes(), &id_key(deal.id.get())[..])?;
        }
        put_entity(&self.deals, deal.id.get(), deal)
    }

    /// Remove the escrow-address index entry for a deal being purged, so
    /// the address can (in principle) be reused once the deal is gone.
    pub fn release_escrow_address_index(&self, address: &str) -> Result<(), StoreError> {
        self.escrow_addresses.remove(address.as_bytes())?;
        Ok(())
    }

    pub fn iter_deals_with_status(&self, status: DealStatus) -> Result<Vec<Deal>, StoreError> {
        Ok(iter_all::<Deal>(&self.deals)?
            .into_iter()
            .filter(|d| d.status == status)
            .collect())
    }

    pub fn iter_all_deals(&self) -> Result<Vec<Deal>, StoreError> {
        iter_all(&self.deals)
    }

    // ── Requirements ─────────────────────────────────────────────────────

    pub fn next_requirement_id(&self) -> Result<RequirementId, StoreError> {
        Ok(RequirementId::new(self.next_id("next_requirement_id")?))
    }

    pub fn get_requirement(&self, id: RequirementId) -> Result<Option<DealRequirement>, StoreError> {
        get_entity(&self.requirements, id.get())
    }

    pub fn put_requirement(&self, req: &DealRequirement) -> Result<(), StoreError> {
        put_entity(&self.requirements, req.id.get(), req)
    }

    pub fn iter_requirements_for_deal(&self, deal_id: DealId) -> Result<Vec<DealRequirement>, StoreError> {
        Ok(iter_all::<DealRequirement>(&self.requirements)?
            .into_iter()
            .filter(|r| r.deal_id == deal_id)
            .collect())
    }

    // ── Creatives ────────────────────────────────────────────────────────

    pub fn next_creative_id(&self) -> Result<CreativeId, StoreError> {
        Ok(CreativeId::new(self.next_id("next_creative_id")?))
    }

    pub fn get_creative(&self, id: CreativeId) -> Result<Option<Creative>, StoreError> {
        get_entity(&self.creatives, id.get())
    }

    pub fn put_creative(&self, creative: &Creative) -> Result<(), StoreError> {
        let existing = self.iter_creatives_for_deal(creative.deal_id)?;
        if existing
            .iter()
            .any(|c| c.version == creative.version && c.id != creative.id)
        {
            return Err(StoreError::Conflict(format!(
                "deal {} already has a version {} creative",
                creative.deal_id, creative.version
            )));
        }
        put_entity(&self.creatives, creative.id.get(), creative)
    }

    pub fn iter_creatives_for_deal(&self, deal_id: DealId) -> Result<Vec<Creative>, StoreError> {
        let mut out: Vec<Creative> = iter_all::<Creative>(&self.creatives)?
            .into_iter()
            .filter(|c| c.deal_id == deal_id)
            .collect();
        out.sort_by_key(|c| c.version);
        Ok(out)
    }

    // ── Transactions ─────────────────────────────────────────────────────

    pub fn next_transaction_id(&self) -> Result<TransactionId, StoreError> {
        Ok(TransactionId::new(self.next_id("next_transaction_id")?))
    }

    pub fn put_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        put_entity(&self.transactions, tx.id.get(), tx)
    }

    pub fn iter_transactions_for_deal(&self, deal_id: DealId) -> Result<Vec<Transaction>, StoreError> {
        Ok(iter_all::<Transaction>(&self.transactions)?
            .into_iter()
            .filter(|t| t.deal_id == deal_id)
            .collect())
    }

    pub fn null_out_transaction_addresses(&self, deal_id: DealId) -> Result<(), StoreError> {
        for mut tx in self.iter_transactions_for_deal(deal_id)? {
            tx.source_address = None;
            tx.dest_address = None;
            tx.chain_tx_id = None;
            self.put_transaction(&tx)?;
        }
        Ok(())
    }

    // ── Pending transfers ────────────────────────────────────────────────

    pub fn next_pending_transfer_id(&self) -> Result<PendingTransferId, StoreError> {
        Ok(PendingTransferId::new(self.next_id("next_pending_transfer_id")?))
    }

    pub fn get_pending_transfer(&self, id: PendingTransferId) -> Result<Option<PendingTransfer>, StoreError> {
        get_entity(&self.pending_transfers, id.get())
    }

    pub fn put_pending_transfer(&self, transfer: &PendingTransfer) -> Result<(), StoreError> {
        put_entity(&self.pending_transfers, transfer.id.get(), transfer)
    }

    pub fn iter_pending_transfers_for_deal(&self, deal_id: DealId) -> Result<Vec<PendingTransfer>, StoreError> {
        Ok(iter_all::<PendingTransfer>(&self.pending_transfers)?
            .into_iter()
            .filter(|t| t.deal_id == deal_id)
            .collect())
    }

    /// PendingTransfers eligible for hop-2 retry:
    /// hop1 succeeded, hop2 hasn't, retry budget remains.
    pub fn iter_retry_eligible_transfers(&self) -> Result<Vec<PendingTransfer>, StoreError> {
        Ok(iter_all::<PendingTransfer>(&self.pending_transfers)?
            .into_iter()
            .filter(|t| t.retry_eligible())
            .collect())
    }

    // ── Events ───────────────────────────────────────────────────────────

    pub fn next_event_id(&self) -> Result<EventId, StoreError> {
        Ok(EventId::new(self.next_id("next_event_id")?))
    }

    pub fn put_event(&self, event: &DealEvent) -> Result<(), StoreError> {
        put_entity(&self.events, event.id.get(), event)
    }

    pub fn iter_events_for_deal(&self, deal_id: DealId) -> Result<Vec<DealEvent>, StoreError> {
        let mut out: Vec<DealEvent> = iter_all::<DealEvent>(&self.events)?
            .into_iter()
            .filter(|e| e.deal_id == deal_id)
            .collect();
        out.sort_by_key(|e| e.id.get());
        Ok(out)
    }

    pub fn delete_events_for_deal(&self, deal_id: DealId) -> Result<(), StoreError> {
        for event in self.iter_events_for_deal(deal_id)? {
            self.events.remove(id_key(event.id.get()))?;
        }
        Ok(())
    }

    // ── Receipts ─────────────────────────────────────────────────────────

    pub fn get_receipt(&self, deal_id: DealId) -> Result<Option<DealReceipt>, StoreError> {
        get_entity(&self.receipts, deal_id.get())
    }

    /// Write the immutable purge receipt. Errors if one already exists for
    /// this deal (invariant: "receipt is immutable once written").
    pub fn put_receipt(&self, receipt: &DealReceipt) -> Result<(), StoreError> {
        if self.get_receipt(receipt.deal_id)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "receipt for deal {} already exists",
                receipt.deal_id
            )));
        }
        put_entity(&self.receipts, receipt.deal_id.get(), receipt)
    }

    // ── Disputes ─────────────────────────────────────────────────────────

    pub fn next_dispute_id(&self) -> Result<DisputeId, StoreError> {
        Ok(DisputeId::new(self.next_id("next_dispute_id")?))
    }

    pub fn get_dispute(&self, id: DisputeId) -> Result<Option<Dispute>, StoreError> {
        get_entity(&self.disputes, id.get())
    }

    pub fn get_dispute_for_deal(&self, deal_id: DealId) -> Result<Option<Dispute>, StoreError> {
        match self.disputes_by_deal.get(id_key(deal_id.get()))? {
            Some(raw) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&raw);
                self.get_dispute(DisputeId::new(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// Insert or update a dispute. Enforces "at most one Dispute per
    /// deal" via the `disputes_by_deal` unique index.
    pub fn put_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        if let Some(existing) = self.disputes_by_deal.get(id_key(dispute.deal_id.get()))? {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&existing);
            if u64::from_be_bytes(arr) != dispute.id.get() {
                return Err(StoreError::Conflict(format!(
                    "deal {} already has a dispute",
                    dispute.deal_id
                )));
            }
        }
        self.disputes_by_deal
            .insert(id_key(dispute.deal_id.get()), &id_key(dispute.id.get())[..])?;
        put_entity(&self.disputes, dispute.id.get(), dispute)
    }

    pub fn iter_disputes_with_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>, StoreError> {
        Ok(iter_all::<Dispute>(&self.disputes)?
            .into_iter()
            .filter(|d| d.status == status)
            .collect())
    }

    // ── Dispute evidence ─────────────────────────────────────────────────

    pub fn next_evidence_id(&self) -> Result<EvidenceId, StoreError> {
        Ok(EvidenceId::new(self.next_id("next_evidence_id")?))
    }

    pub fn put_evidence(&self, evidence: &DisputeEvidence) -> Result<(), StoreError> {
        put_entity(&self.dispute_evidence, evidence.id.get(), evidence)
    }

    pub fn iter_evidence_for_dispute(&self, dispute_id: DisputeId) -> Result<Vec<DisputeEvidence>, StoreError> {
        Ok(iter_all::<DisputeEvidence>(&self.dispute_evidence)?
            .into_iter()
            .filter(|e| e.dispute_id == dispute_id)
            .collect())
    }

    // ── Purge & receipt ─────────────────────────────────────────────────

    /// Null out every sensitive column a purged deal carries. Does not
    /// touch `escrow_addresses`'s reverse index bookkeeping beyond
    /// releasing the one entry for this deal.
    pub fn purge_deal_fields(&self, deal: &mut Deal) -> Result<(), StoreError> {
        if let Some(addr) = deal.escrow_address.take() {
            self.release_escrow_address_index(&addr)?;
        }
        deal.escrow_encrypted_key = None;
        self.put_deal(deal)?;

        for mut creative in self.iter_creatives_for_deal(deal.id)? {
            creative.encrypted_text.clear();
            creative.encrypted_media_url = None;
            self.put_creative(&creative)?;
        }

        self.null_out_transaction_addresses(deal.id)?;
        self.delete_events_for_deal(deal.id)?;
        Ok(())
    }
}

fn get_entity<T: serde::de::DeserializeOwned>(tree: &sled::Tree, id: u64) -> Result<Option<T>, StoreError> {
    match tree.get(id_key(id))? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

fn put_entity<T: serde::Serialize>(tree: &sled::Tree, id: u64, value: &T) -> Result<(), StoreError> {
    let bytes = bincode::serialize(value)?;
    tree.insert(id_key(id), bytes)?;
    Ok(())
}

fn iter_all<T: serde::de::DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for item in tree.iter() {
        let (_, bytes) = item?;
        out.push(bincode::deserialize(&bytes)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advault_core::money::Money;

    fn open_temp() -> (LedgerStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn make_deal(id: DealId, escrow: Option<&str>) -> Deal {
        Deal {
            id,
            channel_id: ChannelId::new(1),
            owner_id: UserId::new(1),
            advertiser_id: UserId::new(2),
            ad_format_id: AdFormatId::new(1),
            status: DealStatus::PendingPayment,
            amount: Money::from_decimal_str("50.0").unwrap(),
            owner_alias: Alias("Seller-aaaa".into()),
            advertiser_alias: Alias("Buyer-bbbb".into()),
            escrow_address: escrow.map(String::from),
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
        }
    }

    #[test]
    fn round_trips_a_deal() {
        let (store, _dir) = open_temp();
        let id = store.next_deal_id().unwrap();
        let deal = make_deal(id, Some("addr1"));
        store.put_deal(&deal).unwrap();
        let fetched = store.require_deal(id).unwrap();
        assert_eq!(fetched.escrow_address.as_deref(), Some("addr1"));
    }

    #[test]
    fn escrow_address_uniqueness_is_enforced() {
        let (store, _dir) = open_temp();
        let id1 = store.next_deal_id().unwrap();
        let id2 = store.next_deal_id().unwrap();
        store.put_deal(&make_deal(id1, Some("shared"))).unwrap();
        let result = store.put_deal(&make_deal(id2, Some("shared")));
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn dispute_per_deal_uniqueness_is_enforced() {
        let (store, _dir) = open_temp();
        let deal_id = DealId::new(1);
        let d1 = Dispute {
            id: DisputeId::new(1),
            deal_id,
            opened_by: UserId::new(2),
            reason: "no post".into(),
            status: DisputeStatus::Open,
            opened_at: 0,
            mutual_deadline: 48 * 3600,
            owner_proposal: None,
            owner_split_percent: None,
            advertiser_proposal: None,
            advertiser_split_percent: None,
            resolved_outcome: None,
            resolved_split_percent: None,
            resolved_by: None,
            resolved_reason: None,
            resolved_at: None,
            escalated_at: None,
        };
        store.put_dispute(&d1).unwrap();
        let mut d2 = d1.clone();
        d2.id = DisputeId::new(2);
        assert!(matches!(store.put_dispute(&d2), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn creative_version_uniqueness_is_enforced() {
        let (store, _dir) = open_temp();
        let deal_id = DealId::new(1);
        let make = |id: u64, version: u32| Creative {
            id: CreativeId::new(id),
            deal_id,
            version,
            encrypted_text: "x".into(),
            encrypted_media_url: None,
            media_type: MediaType::None,
            submitter_id: UserId::new(1),
            reviewer_notes: None,
            status: CreativeStatus::Draft,
            created_at: 0,
        };
        store.put_creative(&make(1, 1)).unwrap();
        assert!(matches!(
            store.put_creative(&make(2, 1)),
            Err(StoreError::Conflict(_))
        ));
        store.put_creative(&make(3, 2)).unwrap();
        assert_eq!(store.iter_creatives_for_deal(deal_id).unwrap().len(), 2);
    }

    #[test]
    fn receipt_is_immutable_once_written() {
        let (store, _dir) = open_temp();
        let receipt = DealReceipt {
            deal_id: DealId::new(1),
            channel_title: "Some Channel".into(),
            owner_alias: Alias("Seller-aaaa".into()),
            advertiser_alias: Alias("Buyer-bbbb".into()),
            amount: Money::from_decimal_str("50.0").unwrap(),
            final_status: DealStatus::Completed,
            completed_at: 100,
            data_hash: "a".repeat(64),
            purged_at: 200,
        };
        store.put_receipt(&receipt).unwrap();
        assert!(matches!(store.put_receipt(&receipt), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn schema_version_is_persisted_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LedgerStore::open(dir.path()).unwrap();
            store.flush().unwrap();
        }
        let store = LedgerStore::open(dir.path()).unwrap();
        let raw = store.get_meta("schema_version").unwrap().unwrap();
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&raw[..4]);
        assert_eq!(u32::from_be_bytes(arr), SCHEMA_VERSION);
    }
}

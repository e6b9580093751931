//! Creative pipeline.
//!
//! Versioned, field-encrypted creatives plus the submit/approve/revision
//! flow that drives the deal state machine alongside them.

use std::sync::Arc;

use advault_core::entities::Creative;
use advault_core::time::now;
use advault_core::types::{CreativeStatus, DealId, DealParty, DealStatus, MediaType, UserId};
use advault_crypto::FieldCipher;
use advault_platform::{AdapterRegistry, ParsedPostUrl};
use advault_store::LedgerStore;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::state_machine::DealEngine;

/// The decrypted payload a channel owner submits.
pub struct CreativePayload {
    pub text: String,
    pub media_url: Option<String>,
    pub media_type: MediaType,
}

/// A creative as returned for display, decrypted. Callers enforce the
/// party check upstream.
pub struct CreativeView {
    pub id: advault_core::types::CreativeId,
    pub version: u32,
    pub text: String,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub status: CreativeStatus,
}

pub struct CreativePipeline {
    engine: Arc<DealEngine>,
    cipher: FieldCipher,
}

impl CreativePipeline {
    pub fn new(engine: Arc<DealEngine>, cipher: FieldCipher) -> Self {
        Self { engine, cipher }
    }

    fn store(&self) -> &Arc<LedgerStore> {
        self.engine.store()
    }

    pub async fn submit_creative(
        &self,
        deal_id: DealId,
        actor: UserId,
        party: DealParty,
        payload: CreativePayload,
    ) -> Result<Creative, EngineError> {
        if party != DealParty::Owner {
            return Err(EngineError::Forbidden);
        }
        let deal = self.store().require_deal(deal_id)?;
        if !matches!(deal.status, DealStatus::CreativePending | DealStatus::CreativeRevision) {
            return Err(EngineError::ValidationFailed(
                "creatives can only be submitted while CreativePending or CreativeRevision".into(),
            ));
        }

        let existing = self.store().iter_creatives_for_deal(deal_id)?;
        let version = existing.iter().map(|c| c.version).max().unwrap_or(0) + 1;

        let encrypted_text = self.cipher.encrypt_str(&payload.text)?;
        let encrypted_media_url = payload.media_url.as_deref().map(|u| self.cipher.encrypt_str(u)).transpose()?;

        let creative = Creative {
            id: self.store().next_creative_id()?,
            deal_id,
            version,
            encrypted_text,
            encrypted_media_url,
            media_type: payload.media_type,
            submitter_id: actor,
            reviewer_notes: None,
            status: CreativeStatus::Submitted,
            created_at: now(),
        };
        self.store().put_creative(&creative)?;

        self.engine
            .transition(deal_id, DealStatus::CreativeSubmitted, Some(actor), json!({ "creative_version": version }))
            .await?;

        Ok(creative)
    }

    pub async fn approve_creative(&self, deal_id: DealId, actor: UserId, party: DealParty) -> Result<Creative, EngineError> {
        if party != DealParty::Advertiser {
            return Err(EngineError::Forbidden);
        }
        let deal = self.store().require_deal(deal_id)?;
        if deal.status != DealStatus::CreativeSubmitted {
            return Err(EngineError::ValidationFailed("deal must be CreativeSubmitted to approve".into()));
        }
        let mut creative = self.latest_submitted(deal_id)?;
        creative.status = CreativeStatus::Approved;
        self.store().put_creative(&creative)?;

        self.engine
            .transition(deal_id, DealStatus::CreativeApproved, Some(actor), serde_json::Value::Null)
            .await?;
        Ok(creative)
    }

    pub async fn request_revision(
        &self,
        deal_id: DealId,
        actor: UserId,
        party: DealParty,
        notes: String,
    ) -> Result<Creative, EngineError> {
        if party != DealParty::Advertiser {
            return Err(EngineError::Forbidden);
        }
        let deal = self.store().require_deal(deal_id)?;
        if deal.status != DealStatus::CreativeSubmitted {
            return Err(EngineError::ValidationFailed("deal must be CreativeSubmitted to request revision".into()));
        }
        let mut creative = self.latest_submitted(deal_id)?;
        creative.status = CreativeStatus::RevisionRequested;
        creative.reviewer_notes = Some(notes);
        self.store().put_creative(&creative)?;

        self.engine
            .transition(deal_id, DealStatus::CreativeRevision, Some(actor), serde_json::Value::Null)
            .await?;
        Ok(creative)
    }

    /// `verify` toggles the adapter's `verify_post_exists` call,
    /// skippable in dev/test environments.
    pub async fn submit_post_proof(
        &self,
        deal_id: DealId,
        actor: UserId,
        party: DealParty,
        post_url: &str,
        registry: &AdapterRegistry,
        verify: bool,
    ) -> Result<Creative, EngineError> {
        if party != DealParty::Owner {
            return Err(EngineError::Forbidden);
        }
        let mut deal = self.store().require_deal(deal_id)?;
        if deal.status != DealStatus::CreativeApproved {
            return Err(EngineError::ValidationFailed("deal must be CreativeApproved to submit post proof".into()));
        }

        let adapter = registry.get(&deal.channel_platform_tag(self.store())?)?;
        let ParsedPostUrl { post_id, .. } = adapter
            .parse_post_url(post_url)
            .map_err(|_| EngineError::UnparseableUrl(post_url.to_string()))?;

        if verify {
            let exists = adapter.verify_post_exists(post_url).await?;
            if !exists {
                return Err(EngineError::ValidationFailed("post could not be verified at the submitted url".into()));
            }
        }

        let approved = self.approved_creative(deal_id)?;
        let text = self.cipher.decrypt_str(&approved.encrypted_text)?;
        let media_url = approved.encrypted_media_url.as_deref().map(|c| self.cipher.decrypt_str(c)).transpose()?;
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(media_url.unwrap_or_default().as_bytes());
        let content_hash = hex::encode(hasher.finalize());

        deal.posted_platform_id = Some(post_id);
        deal.post_proof_url = Some(post_url.to_string());
        deal.content_hash = Some(content_hash);
        deal.tracking_started_at = Some(now());
        self.store().put_deal(&deal)?;

        self.engine.transition(deal_id, DealStatus::Posted, Some(actor), serde_json::Value::Null).await?;
        self.engine.transition(deal_id, DealStatus::Tracking, Some(actor), serde_json::Value::Null).await?;

        Ok(approved)
    }

    /// Callers enforce the party check upstream.
    pub fn creatives_for_display(&self, deal_id: DealId) -> Result<Vec<CreativeView>, EngineError> {
        self.store()
            .iter_creatives_for_deal(deal_id)?
            .into_iter()
            .map(|c| {
                let text = self.cipher.decrypt_str(&c.encrypted_text)?;
                let media_url = c.encrypted_media_url.as_deref().map(|e| self.cipher.decrypt_str(e)).transpose()?;
                Ok(CreativeView { id: c.id, version: c.version, text, media_url, media_type: c.media_type, status: c.status })
            })
            .collect()
    }

    fn latest_submitted(&self, deal_id: DealId) -> Result<Creative, EngineError> {
        self.store()
            .iter_creatives_for_deal(deal_id)?
            .into_iter()
            .filter(|c| c.status == CreativeStatus::Submitted)
            .max_by_key(|c| c.version)
            .ok_or_else(|| EngineError::ValidationFailed("no submitted creative found".into()))
    }

    /// The canonical creative: the newest version with status Approved.
    fn approved_creative(&self, deal_id: DealId) -> Result<Creative, EngineError> {
        self.store()
            .iter_creatives_for_deal(deal_id)?
            .into_iter()
            .filter(|c| c.status == CreativeStatus::Approved)
            .max_by_key(|c| c.version)
            .ok_or_else(|| EngineError::ValidationFailed("no approved creative found".into()))
    }
}

trait DealChannelTag {
    fn channel_platform_tag(&self, store: &LedgerStore) -> Result<advault_core::types::PlatformTag, EngineError>;
}

impl DealChannelTag for advault_core::entities::Deal {
    fn channel_platform_tag(&self, store: &LedgerStore) -> Result<advault_core::types::PlatformTag, EngineError> {
        let channel = store
            .get_channel(self.channel_id)?
            .ok_or_else(|| EngineError::ValidationFailed(format!("channel {} not found", self.channel_id)))?;
        Ok(channel.platform)
    }
}

#[cfg(test)]
mod tests {
    use advault_core::entities::{Channel, ChannelStats, Deal};
    use advault_core::money::Money;
    use advault_core::types::{AdFormatId, Alias, ChannelId, PlatformTag};
    use advault_platform::mock::MockPlatformAdapter;
    use advault_store::{DealLocks, LedgerStore};

    use super::*;

    fn harness() -> (CreativePipeline, AdapterRegistry, DealId, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LedgerStore::open(dir.path()).unwrap());
        let locks = Arc::new(DealLocks::new());
        let engine = Arc::new(DealEngine::new(store.clone(), locks));
        let cipher = FieldCipher::new([3u8; 32]);
        let pipeline = CreativePipeline::new(engine, cipher);

        let channel_id = store.next_channel_id().unwrap();
        store
            .put_channel(&Channel {
                id: channel_id,
                owner_id: UserId::new(1),
                platform: PlatformTag::Telegram,
                platform_channel_id: "chan1".into(),
                title: "Test Channel".into(),
                stats: ChannelStats::default(),
                verified: true,
                verified_at: None,
                verification_token: None,
                created_at: 0,
                stats_refreshed_at: None,
            })
            .unwrap();

        let deal_id = store.next_deal_id().unwrap();
        store
            .put_deal(&Deal {
                id: deal_id,
                channel_id,
                owner_id: UserId::new(1),
                advertiser_id: UserId::new(2),
                ad_format_id: AdFormatId::new(1),
                status: DealStatus::CreativePending,
                amount: Money::from_decimal_str("10.0").unwrap(),
                owner_alias: Alias("Seller-aaaa".into()),
                advertiser_alias: Alias("Buyer-bbbb".into()),
                escrow_address: None,
                escrow_encrypted_key: None,
                timeout_at: None,
                verification_window_hours: 24,
                tracking_started_at: None,
                posted_platform_id: None,
                post_proof_url: None,
                content_hash: None,
                completed_at: None,
                created_at: 0,
                updated_at: 0,
            })
            .unwrap();

        let mut registry = AdapterRegistry::new();
        registry.register(PlatformTag::Telegram, Arc::new(MockPlatformAdapter::new(PlatformTag::Telegram)));

        (pipeline, registry, deal_id, dir)
    }

    #[tokio::test]
    async fn full_submit_approve_post_flow_assigns_content_hash() {
        let (pipeline, registry, deal_id, _dir) = harness();

        let creative = pipeline
            .submit_creative(
                deal_id,
                UserId::new(1),
                DealParty::Owner,
                CreativePayload { text: "Buy!".into(), media_url: None, media_type: MediaType::None },
            )
            .await
            .unwrap();
        assert_eq!(creative.version, 1);

        pipeline.approve_creative(deal_id, UserId::new(2), DealParty::Advertiser).await.unwrap();

        let post_url = "https://mock/chan1/42";
        let approved = pipeline
            .submit_post_proof(deal_id, UserId::new(1), DealParty::Owner, post_url, &registry, true)
            .await
            .unwrap();
        assert_eq!(approved.status, CreativeStatus::Approved);

        let deal = pipeline.store().require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::Tracking);
        assert!(deal.content_hash.is_some());
        assert_eq!(deal.posted_platform_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn revision_requested_sends_deal_back_to_creative_revision() {
        let (pipeline, _registry, deal_id, _dir) = harness();
        pipeline
            .submit_creative(
                deal_id,
                UserId::new(1),
                DealParty::Owner,
                CreativePayload { text: "Draft".into(), media_url: None, media_type: MediaType::None },
            )
            .await
            .unwrap();
        pipeline
            .request_revision(deal_id, UserId::new(2), DealParty::Advertiser, "needs a CTA".into())
            .await
            .unwrap();
        let deal = pipeline.store().require_deal(deal_id).unwrap();
        assert_eq!(deal.status, DealStatus::CreativeRevision);
    }

    #[tokio::test]
    async fn version_numbers_increment_with_no_gaps_across_a_revision_cycle() {
        let (pipeline, _registry, deal_id, _dir) = harness();
        pipeline
            .submit_creative(
                deal_id,
                UserId::new(1),
                DealParty::Owner,
                CreativePayload { text: "v1".into(), media_url: None, media_type: MediaType::None },
            )
            .await
            .unwrap();
        pipeline
            .request_revision(deal_id, UserId::new(2), DealParty::Advertiser, "fix it".into())
            .await
            .unwrap();
        pipeline
            .submit_creative(
                deal_id,
                UserId::new(1),
                DealParty::Owner,
                CreativePayload { text: "v2".into(), media_url: None, media_type: MediaType::None },
            )
            .await
            .unwrap();
        let versions: Vec<u32> =
            pipeline.store().iter_creatives_for_deal(deal_id).unwrap().into_iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn submitting_creative_as_advertiser_is_forbidden() {
        let (pipeline, _registry, deal_id, _dir) = harness();
        let err = pipeline
            .submit_creative(
                deal_id,
                UserId::new(2),
                DealParty::Advertiser,
                CreativePayload { text: "nope".into(), media_url: None, media_type: MediaType::None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden));
    }
}

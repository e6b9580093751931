//! The persisted domain entities.
//!
//! Plain structs, `Clone + Debug + Serialize + Deserialize`, no behavior —
//! `advault-engine`/`advault-saga`/`advault-dispute` hold the rules.
//! Fields that can be populated after creation follow a
//! `#[serde(default)]` convention so records written by an older schema
//! version still deserialize.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub display_handle: Option<String>,
    pub role: Role,
    pub payout_wallet: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub subscribers: u64,
    pub avg_views: u64,
    pub premium_fraction: f64,
    /// language code -> fraction of audience, should sum to ~1.0.
    pub language_distribution: Vec<(String, f64)>,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            subscribers: 0,
            avg_views: 0,
            premium_fraction: 0.0,
            language_distribution: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub owner_id: UserId,
    pub platform: PlatformTag,
    pub platform_channel_id: String,
    /// Plaintext display title — not a privacy secret, so it survives
    /// post-completion purge onto the deal's `DealReceipt`.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub stats: ChannelStats,
    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    pub verification_token: Option<String>,
    pub created_at: Timestamp,
    pub stats_refreshed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdFormat {
    pub id: AdFormatId,
    pub channel_id: ChannelId,
    pub format_type: AdFormatType,
    pub label: String,
    pub price: Money,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub channel_id: ChannelId,
    pub owner_id: UserId,
    pub advertiser_id: UserId,
    pub ad_format_id: AdFormatId,
    pub status: DealStatus,
    pub amount: Money,
    pub owner_alias: Alias,
    pub advertiser_alias: Alias,
    pub escrow_address: Option<String>,
    pub escrow_encrypted_key: Option<String>,
    pub timeout_at: Option<Timestamp>,
    pub verification_window_hours: u32,
    pub tracking_started_at: Option<Timestamp>,
    pub posted_platform_id: Option<String>,
    pub post_proof_url: Option<String>,
    pub content_hash: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRequirement {
    pub id: RequirementId,
    pub deal_id: DealId,
    pub metric_type: MetricType,
    pub target_value: u64,
    pub current_value: u64,
    pub status: RequirementStatus,
    pub last_checked_at: Option<Timestamp>,
    pub met_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub id: CreativeId,
    pub deal_id: DealId,
    pub version: u32,
    pub encrypted_text: String,
    pub encrypted_media_url: Option<String>,
    pub media_type: MediaType,
    pub submitter_id: UserId,
    pub reviewer_notes: Option<String>,
    pub status: CreativeStatus,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub deal_id: DealId,
    pub tx_type: TransactionType,
    pub amount: Money,
    pub source_address: Option<String>,
    pub dest_address: Option<String>,
    pub chain_tx_id: Option<String>,
    pub confirmed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub id: PendingTransferId,
    pub deal_id: DealId,
    pub saga_type: SagaType,
    pub recipient_address: String,
    pub amount: Money,
    pub hop1_tx_id: Option<String>,
    pub hop2_tx_id: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PendingTransfer {
    /// Invariant: hop2_tx_id non-null ⇔ completed_at non-null.
    pub fn invariant_holds(&self) -> bool {
        self.hop2_tx_id.is_some() == self.completed_at.is_some()
    }

    /// Eligible for hop-2 retry only when hop1 succeeded, hop2 hasn't,
    /// and the attempt budget remains.
    pub fn retry_eligible(&self) -> bool {
        self.hop1_tx_id.is_some() && self.hop2_tx_id.is_none() && self.retry_count < 5
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealEvent {
    pub id: EventId,
    pub deal_id: DealId,
    pub event_type: String,
    pub old_status: Option<DealStatus>,
    pub new_status: Option<DealStatus>,
    pub actor_id: Option<UserId>,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealReceipt {
    pub deal_id: DealId,
    pub channel_title: String,
    pub owner_alias: Alias,
    pub advertiser_alias: Alias,
    pub amount: Money,
    pub final_status: DealStatus,
    pub completed_at: Timestamp,
    pub data_hash: String,
    pub purged_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub deal_id: DealId,
    pub opened_by: UserId,
    pub reason: String,
    pub status: DisputeStatus,
    pub opened_at: Timestamp,
    pub mutual_deadline: Timestamp,
    pub owner_proposal: Option<DisputeOutcome>,
    pub owner_split_percent: Option<u8>,
    pub advertiser_proposal: Option<DisputeOutcome>,
    pub advertiser_split_percent: Option<u8>,
    pub resolved_outcome: Option<DisputeOutcome>,
    pub resolved_split_percent: Option<u8>,
    pub resolved_by: Option<UserId>,
    pub resolved_reason: Option<String>,
    pub resolved_at: Option<Timestamp>,
    pub escalated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeEvidence {
    pub id: EvidenceId,
    pub dispute_id: DisputeId,
    pub submitted_by: UserId,
    pub description: String,
    pub url: Option<String>,
    pub created_at: Timestamp,
}

//! Dispute resolution protocol.
//!
//! `Open` → (implicit `MutualResolution` once either party has
//! proposed) → either `Resolved` (the parties agree) or `AdminReview`
//! (the 48h mutual window elapses, driven by the escalator worker) →
//! `Resolved` (admin). Execution of a resolved outcome hands off to
//! `advault-saga`, which is what actually moves funds and drives the
//! deal to its terminal state.

use std::sync::Arc;

use advault_core::entities::{Dispute, DisputeEvidence};
use advault_core::time::{hours_from_now, now};
use advault_core::types::{
    DealId, DealParty, DealStatus, DisputeId, DisputeOutcome, DisputeStatus, UserId,
};
use advault_core::constants::DISPUTE_MUTUAL_WINDOW_HOURS;
use advault_engine::DealEngine;
use advault_saga::EscrowSaga;
use advault_store::LedgerStore;
use serde_json::json;

use crate::error::DisputeError;

/// Whether [`DisputeProtocol::propose_resolution`] auto-executed the
/// agreed outcome.
pub struct ProposeResult {
    pub auto_executed: bool,
}

pub struct DisputeProtocol {
    engine: Arc<DealEngine>,
    saga: Arc<EscrowSaga>,
}

impl DisputeProtocol {
    pub fn new(engine: Arc<DealEngine>, saga: Arc<EscrowSaga>) -> Self {
        Self { engine, saga }
    }

    fn store(&self) -> &Arc<LedgerStore> {
        self.engine.store()
    }

    /// `openDispute(deal, actor, reason)`.
    pub async fn open(
        &self,
        deal_id: DealId,
        actor: UserId,
        party: DealParty,
        reason: String,
    ) -> Result<Dispute, DisputeError> {
        if party == DealParty::Admin {
            return Err(DisputeError::Forbidden);
        }
        if self.store().get_dispute_for_deal(deal_id)?.is_some() {
            return Err(DisputeError::AlreadyDisputed(deal_id));
        }
        let deal = self.store().require_deal(deal_id).map_err(|_| DisputeError::DealNotFound(deal_id))?;
        if !matches!(
            deal.status,
            DealStatus::Funded
                | DealStatus::CreativePending
                | DealStatus::CreativeSubmitted
                | DealStatus::CreativeRevision
                | DealStatus::CreativeApproved
                | DealStatus::Posted
                | DealStatus::Tracking
                | DealStatus::Failed
        ) {
            return Err(DisputeError::InvalidState(format!(
                "a dispute cannot be opened while the deal is {:?}",
                deal.status
            )));
        }

        self.engine
            .transition(deal_id, DealStatus::Disputed, Some(actor), json!({ "reason": reason }))
            .await?;

        let dispute = Dispute {
            id: self.store().next_dispute_id()?,
            deal_id,
            opened_by: actor,
            reason,
            status: DisputeStatus::Open,
            opened_at: now(),
            mutual_deadline: hours_from_now(DISPUTE_MUTUAL_WINDOW_HOURS),
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
        self.store().put_dispute(&dispute)?;
        Ok(dispute)
    }

    /// `submitEvidence(dealId, actor, description, url?)`.
    pub fn submit_evidence(
        &self,
        deal_id: DealId,
        actor: UserId,
        party: DealParty,
        description: String,
        url: Option<String>,
    ) -> Result<DisputeEvidence, DisputeError> {
        if party == DealParty::Admin {
            return Err(DisputeError::Forbidden);
        }
        let dispute = self.require_open_dispute(deal_id)?;

        let evidence = DisputeEvidence {
            id: self.store().next_evidence_id()?,
            dispute_id: dispute.id,
            submitted_by: actor,
            description,
            url,
            created_at: now(),
        };
        self.store().put_evidence(&evidence)?;
        Ok(evidence)
    }

    /// `proposeResolution(dealId, actor, outcome, splitPct?)`. Auto-executes
    /// when both parties have proposed the same outcome (and, for
    /// `Split`, the same percentage).
    pub async fn propose_resolution(
        &self,
        deal_id: DealId,
        party: DealParty,
        outcome: DisputeOutcome,
        split_percent: Option<u8>,
    ) -> Result<ProposeResult, DisputeError> {
        if party == DealParty::Admin {
            return Err(DisputeError::Forbidden);
        }
        validate_split(outcome, split_percent)?;
        let mut dispute = self.require_open_dispute(deal_id)?;

        match party {
            DealParty::Owner => {
                dispute.owner_proposal = Some(outcome);
                dispute.owner_split_percent = split_percent;
            }
            DealParty::Advertiser => {
                dispute.advertiser_proposal = Some(outcome);
                dispute.advertiser_split_percent = split_percent;
            }
            DealParty::Admin => unreachable!("checked above"),
        }
        if dispute.status == DisputeStatus::Open {
            dispute.status = DisputeStatus::MutualResolution;
        }

        let agree = match (dispute.owner_proposal, dispute.advertiser_proposal) {
            (Some(a), Some(b)) if a == b => match a {
                DisputeOutcome::Split => dispute.owner_split_percent == dispute.advertiser_split_percent,
                _ => true,
            },
            _ => false,
        };

        if agree {
            self.execute_outcome(&mut dispute, outcome, split_percent, None, None).await?;
            Ok(ProposeResult { auto_executed: true })
        } else {
            self.store().put_dispute(&dispute)?;
            Ok(ProposeResult { auto_executed: false })
        }
    }

    /// `acceptProposal(dealId, actor)`: adopts the other party's
    /// standing proposal as the resolution, if one exists.
    pub async fn accept_proposal(&self, deal_id: DealId, party: DealParty) -> Result<Dispute, DisputeError> {
        if party == DealParty::Admin {
            return Err(DisputeError::Forbidden);
        }
        let mut dispute = self.require_open_dispute(deal_id)?;

        let (outcome, split_percent) = match party {
            DealParty::Owner => (dispute.advertiser_proposal, dispute.advertiser_split_percent),
            DealParty::Advertiser => (dispute.owner_proposal, dispute.owner_split_percent),
            DealParty::Admin => unreachable!("checked above"),
        };
        let outcome = outcome.ok_or_else(|| DisputeError::ValidationFailed("no proposal to accept".into()))?;

        self.execute_outcome(&mut dispute, outcome, split_percent, None, None).await?;
        Ok(dispute)
    }

    /// `adminResolve(dispute, admin, outcome, reason, splitPct?)`.
    /// Allowed only once the dispute has been escalated.
    pub async fn admin_resolve(
        &self,
        deal_id: DealId,
        admin: UserId,
        outcome: DisputeOutcome,
        reason: String,
        split_percent: Option<u8>,
    ) -> Result<Dispute, DisputeError> {
        validate_split(outcome, split_percent)?;
        let mut dispute = self
            .store()
            .get_dispute_for_deal(deal_id)?
            .ok_or(DisputeError::DealNotFound(deal_id))?;
        if dispute.status != DisputeStatus::AdminReview {
            return Err(DisputeError::NotEscalated);
        }
        self.execute_outcome(&mut dispute, outcome, split_percent, Some(admin), Some(reason)).await?;
        Ok(dispute)
    }

    /// Called by the dispute escalator worker: moves a dispute whose mutual window has elapsed from
    /// `Open`/`MutualResolution` to `AdminReview`. The deal itself stays
    /// `Disputed` until an admin resolves it.
    pub fn escalate(&self, dispute_id: DisputeId) -> Result<Dispute, DisputeError> {
        let mut dispute = self
            .store()
            .get_dispute(dispute_id)?
            .ok_or(DisputeError::DisputeNotFound(dispute_id))?;
        if !matches!(dispute.status, DisputeStatus::Open | DisputeStatus::MutualResolution) {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} cannot be escalated from {:?}",
                dispute.status
            )));
        }
        dispute.status = DisputeStatus::AdminReview;
        dispute.escalated_at = Some(now());
        self.store().put_dispute(&dispute)?;
        Ok(dispute)
    }

    fn require_open_dispute(&self, deal_id: DealId) -> Result<Dispute, DisputeError> {
        let dispute = self
            .store()
            .get_dispute_for_deal(deal_id)?
            .ok_or(DisputeError::DealNotFound(deal_id))?;
        if dispute.status == DisputeStatus::Resolved {
            return Err(DisputeError::InvalidState("dispute is already resolved".into()));
        }
        Ok(dispute)
    }

    /// Stamps the resolution onto `dispute` and hands execution off to
    /// the saga: `ReleaseToOwner`/`RefundToAdvertiser` map directly;
    /// `Split` is simplified to a binary outcome — creator share ≥50% is
    /// treated as a full release, otherwise a full refund, with the
    /// agreed percentage recorded for audit rather than acted on by a
    /// three-way saga.
    async fn execute_outcome(
        &self,
        dispute: &mut Dispute,
        outcome: DisputeOutcome,
        split_percent: Option<u8>,
        resolved_by: Option<UserId>,
        resolved_reason: Option<String>,
    ) -> Result<(), DisputeError> {
        dispute.resolved_outcome = Some(outcome);
        dispute.resolved_split_percent = split_percent;
        dispute.resolved_by = resolved_by;
        dispute.resolved_reason = resolved_reason;
        dispute.resolved_at = Some(now());
        dispute.status = DisputeStatus::Resolved;
        self.store().put_dispute(dispute)?;

        match outcome {
            DisputeOutcome::ReleaseToOwner => {
                self.saga.release_funds(dispute.deal_id).await?;
            }
            DisputeOutcome::RefundToAdvertiser => {
                self.saga.refund_funds(dispute.deal_id).await?;
            }
            DisputeOutcome::Split => {
                if split_percent.unwrap_or(0) >= 50 {
                    self.saga.release_funds(dispute.deal_id).await?;
                } else {
                    self.saga.refund_funds(dispute.deal_id).await?;
                }
            }
        }
        Ok(())
    }
}

fn validate_split(outcome: DisputeOutcome, split_percent: Option<u8>) -> Result<(), DisputeError> {
    if outcome == DisputeOutcome::Split {
        match split_percent {
            Some(p) if p <= 100 => Ok(()),
            _ => Err(DisputeError::ValidationFailed("splitPct must be in [0, 100] for a Split outcome".into())),
        }
    } else {
        Ok(())
    }
}

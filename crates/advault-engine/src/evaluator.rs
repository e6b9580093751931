//! Requirement evaluator.
//!
//! Maps a `PostMetrics` snapshot onto a deal's requirements. `Met` and
//! `Waived` are latched: once set, a later observation never reverts
//! them.

use std::sync::Arc;

use advault_core::entities::{Deal, DealRequirement};
use advault_core::time::now;
use advault_core::types::{DealParty, DealStatus, MetricType, RequirementId, RequirementStatus, UserId};
use advault_platform::PostMetrics;
use advault_store::LedgerStore;

use crate::error::EngineError;

/// Per-requirement outcome of one evaluation pass.
#[derive(Debug, Clone)]
pub struct RequirementOutcome {
    pub requirement_id: RequirementId,
    pub current_value: u64,
    pub met: bool,
}

/// Result of [`RequirementEvaluator::evaluate`].
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub all_met: bool,
    pub per_requirement: Vec<RequirementOutcome>,
}

/// Result of [`RequirementEvaluator::waive`].
pub struct WaiveResult {
    pub auto_verify: bool,
}

pub struct RequirementEvaluator {
    store: Arc<LedgerStore>,
}

impl RequirementEvaluator {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Evaluates every requirement on `deal_id` against `metrics`.
    /// Persists `current_value`/`last_checked_at` on every read, latches
    /// `Met` on first crossing, and never un-latches.
    pub fn evaluate(&self, deal_id: advault_core::types::DealId, metrics: &PostMetrics) -> Result<EvaluationResult, EngineError> {
        let requirements = self.store.iter_requirements_for_deal(deal_id)?;
        let mut outcomes = Vec::with_capacity(requirements.len());
        let mut all_met = true;

        for mut req in requirements {
            if matches!(req.status, RequirementStatus::Met | RequirementStatus::Waived) {
                outcomes.push(RequirementOutcome {
                    requirement_id: req.id,
                    current_value: req.current_value,
                    met: true,
                });
                continue;
            }

            if req.metric_type == MetricType::Custom {
                all_met = false;
                outcomes.push(RequirementOutcome { requirement_id: req.id, current_value: req.current_value, met: false });
                continue;
            }

            let (current_value, met) = if req.metric_type == MetricType::PostExists {
                (metrics.exists as u64, metrics.exists)
            } else {
                match metric_field(req.metric_type, metrics) {
                    Some(value) => (value, value >= req.target_value),
                    None => (req.current_value, false),
                }
            };

            req.current_value = current_value;
            req.last_checked_at = Some(now());
            if met && req.status == RequirementStatus::Pending {
                req.status = RequirementStatus::Met;
                req.met_at = Some(now());
            }
            self.store.put_requirement(&req)?;

            if req.status != RequirementStatus::Met {
                all_met = false;
            }
            outcomes.push(RequirementOutcome { requirement_id: req.id, current_value, met: req.status == RequirementStatus::Met });
        }

        Ok(EvaluationResult { all_met, per_requirement: outcomes })
    }

    /// Waives a requirement. Advertiser only; the deal must be Tracking
    /// or Failed.
    pub fn waive(&self, deal: &Deal, party: DealParty, req_id: RequirementId) -> Result<WaiveResult, EngineError> {
        if party != DealParty::Advertiser {
            return Err(EngineError::Forbidden);
        }
        if !matches!(deal.status, DealStatus::Tracking | DealStatus::Failed) {
            return Err(EngineError::ValidationFailed(
                "requirements can only be waived while Tracking or Failed".into(),
            ));
        }
        let mut req = self
            .store
            .get_requirement(req_id)?
            .ok_or(EngineError::RequirementNotFound(req_id))?;
        req.status = RequirementStatus::Waived;
        self.store.put_requirement(&req)?;

        let requirements = self.store.iter_requirements_for_deal(deal.id)?;
        let all_met = requirements
            .iter()
            .all(|r| matches!(r.status, RequirementStatus::Met | RequirementStatus::Waived));

        // Failed cannot auto-advance directly to Verified: it must go
        // through Disputed or be admin-resolved.
        let auto_verify = all_met && deal.status == DealStatus::Tracking;
        Ok(WaiveResult { auto_verify })
    }

    /// Confirms a custom requirement. Advertiser only; the requirement
    /// must be Custom.
    pub fn confirm(&self, _actor: UserId, party: DealParty, req_id: RequirementId) -> Result<DealRequirement, EngineError> {
        if party != DealParty::Advertiser {
            return Err(EngineError::Forbidden);
        }
        let mut req = self
            .store
            .get_requirement(req_id)?
            .ok_or(EngineError::RequirementNotFound(req_id))?;
        if req.metric_type != MetricType::Custom {
            return Err(EngineError::ValidationFailed("confirm is only valid for Custom requirements".into()));
        }
        req.current_value = req.target_value;
        req.status = RequirementStatus::Met;
        req.met_at = Some(now());
        self.store.put_requirement(&req)?;
        Ok(req)
    }
}

fn metric_field(metric_type: MetricType, metrics: &PostMetrics) -> Option<u64> {
    match metric_type {
        MetricType::Views => metrics.views,
        MetricType::Likes => metrics.likes,
        MetricType::Comments => metrics.comments,
        MetricType::Shares => metrics.shares,
        MetricType::PostExists | MetricType::Custom => None,
    }
}

use advault_core::types::{DealId, DealStatus, Timestamp};

/// A deal's status advanced. Every `DealEngine::transition` call emits
/// exactly one of these alongside its `DealEvent` row.
#[derive(Debug, Clone)]
pub struct DealStatusChanged {
    pub deal_id: DealId,
    pub old_status: DealStatus,
    pub new_status: DealStatus,
    pub at: Timestamp,
}

//! Shared identifiers and enums for the deal data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp, seconds UTC. Stored as a raw integer throughout the
/// store for parity with chain timestamps; richer date arithmetic
/// (soft-timeout tables, 48h dispute deadlines) is done with `chrono` at
/// the call site and converted back to seconds before persisting.
pub type Timestamp = i64;

macro_rules! surrogate_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(v: u64) -> Self {
                Self(v)
            }
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_id!(UserId);
surrogate_id!(ChannelId);
surrogate_id!(AdFormatId);
surrogate_id!(DealId);
surrogate_id!(RequirementId);
surrogate_id!(CreativeId);
surrogate_id!(TransactionId);
surrogate_id!(PendingTransferId);
surrogate_id!(EventId);
surrogate_id!(DisputeId);
surrogate_id!(EvidenceId);

/// An opaque, non-identifying label shown to the counterparty instead of
/// a real handle. Not reversible, not secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias(pub String);

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The platform tag a channel/deal is associated with. Left open-ended
/// (`Custom`) since concrete platform adapters are out of scope here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformTag {
    Telegram,
    YouTube,
    Twitter,
    Custom(String),
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTag::Telegram => write!(f, "telegram"),
            PlatformTag::YouTube => write!(f, "youtube"),
            PlatformTag::Twitter => write!(f, "twitter"),
            PlatformTag::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// A user's commercial role. Upgrades are monotonic — once `Both`, a
/// user never reverts to a single role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    CreatorOnly,
    AdvertiserOnly,
    Both,
}

impl Role {
    /// Upgrade this role to account for acting in `other`'s capacity.
    /// Monotonic: `CreatorOnly.upgrade(AdvertiserOnly) == Both`, and
    /// `Both` never downgrades.
    pub fn upgrade(self, acted_as: Role) -> Role {
        use Role::*;
        match (self, acted_as) {
            (Both, _) | (_, Both) => Both,
            (a, b) if a == b => a,
            _ => Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdFormatType {
    Post,
    Forward,
    Story,
    Video,
    Reel,
    Tweet,
    CommunityPost,
    Custom,
}

/// Deal lifecycle status — the state-machine graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    PendingPayment,
    Funded,
    CreativePending,
    CreativeSubmitted,
    CreativeRevision,
    CreativeApproved,
    Posted,
    Tracking,
    Verified,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    Disputed,
    TimedOut,
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl DealStatus {
    /// Terminal states have zero outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DealStatus::Completed | DealStatus::Cancelled | DealStatus::Refunded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    PostExists,
    Views,
    Likes,
    Comments,
    Shares,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementStatus {
    Pending,
    Met,
    Waived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreativeStatus {
    Draft,
    Submitted,
    Approved,
    RevisionRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Video,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Release,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaType {
    Release,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeStatus {
    Open,
    MutualResolution,
    AdminReview,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeOutcome {
    ReleaseToOwner,
    RefundToAdvertiser,
    Split,
}

/// Which deal party is acting, for authorization checks that need to
/// distinguish "the channel owner" from "the advertiser" without going
/// back through `UserId` equality at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealParty {
    Owner,
    Advertiser,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_upgrade_is_monotonic() {
        assert_eq!(Role::CreatorOnly.upgrade(Role::CreatorOnly), Role::CreatorOnly);
        assert_eq!(Role::CreatorOnly.upgrade(Role::AdvertiserOnly), Role::Both);
        assert_eq!(Role::Both.upgrade(Role::CreatorOnly), Role::Both);
    }

    #[test]
    fn terminal_states() {
        assert!(DealStatus::Completed.is_terminal());
        assert!(DealStatus::Cancelled.is_terminal());
        assert!(DealStatus::Refunded.is_terminal());
        assert!(!DealStatus::TimedOut.is_terminal());
        assert!(!DealStatus::Failed.is_terminal());
    }
}

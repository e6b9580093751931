//! The platform adapter trait.
//!
//! Rust traits can't express "optional methods" the way an
//! interface-with-optional-members can, so the admin-discovery
//! capability (`verifyUserAdmin`, `fetchAdmins`) lives on a separate
//! supertrait: a common capability trait plus a side trait for optional
//! admin-discovery; callers feature-test with a type/capability check.
//! A registry entry carries the required adapter plus an optional
//! admin-capable one.

use async_trait::async_trait;

use advault_core::types::AdFormatType;

use crate::error::PlatformError;

/// Cached audience/channel stats the adapter can report.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub title: String,
    pub subscribers: u64,
    pub avg_views: u64,
    pub premium_fraction: f64,
    pub language_distribution: Vec<(String, f64)>,
}

/// `exists` + per-metric `Option<u64>` — absent means "platform does not
/// expose this metric" (distinct from zero).
///
/// `content_hash`, when the adapter can report it, is the current
/// on-platform content hash of the post — compared against the deal's
/// stamped `content_hash` to detect a post edited after submission.
#[derive(Debug, Clone, Default)]
pub struct PostMetrics {
    pub exists: bool,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
    pub content_hash: Option<String>,
}

/// The result of parsing a platform-specific post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPostUrl {
    pub platform_channel_id: String,
    pub post_id: String,
}

/// The capability set every platform adapter must implement.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Fetch current audience stats for a channel.
    async fn fetch_channel_info(&self, platform_channel_id: &str) -> Result<ChannelInfo, PlatformError>;

    /// Whether this platform/adapter can post the given ad format at all.
    fn can_post(&self, format_type: AdFormatType) -> bool;

    /// Publish a post, returning the platform-native post id.
    async fn publish_post(
        &self,
        platform_channel_id: &str,
        text: &str,
        media_url: Option<&str>,
    ) -> Result<String, PlatformError>;

    /// Confirm a post at `post_url` still exists (`submitPostProof`).
    async fn verify_post_exists(&self, post_url: &str) -> Result<bool, PlatformError>;

    /// Current engagement metrics for a post (evaluator input).
    async fn fetch_post_metrics(&self, post_url: &str) -> Result<PostMetrics, PlatformError>;

    /// Parse a platform-specific post URL into channel id + post id.
    /// `PlatformError::UnparseableUrl` on no match.
    fn parse_post_url(&self, url: &str) -> Result<ParsedPostUrl, PlatformError>;

    /// Construct the canonical URL for a post, given its platform id.
    fn get_post_url(&self, platform_channel_id: &str, post_id: &str) -> String;

    /// Construct the canonical URL for a channel.
    fn get_channel_url(&self, platform_channel_id: &str) -> String;
}

/// Optional per-platform admin-discovery capability (`verifyUserAdmin`,
/// `fetchAdmins`). Not every platform exposes an admin list via its
/// public API.
#[async_trait]
pub trait AdminCapableAdapter: PlatformAdapter {
    async fn verify_user_admin(
        &self,
        platform_channel_id: &str,
        external_user_id: &str,
    ) -> Result<bool, PlatformError>;

    async fn fetch_admins(&self, platform_channel_id: &str) -> Result<Vec<String>, PlatformError>;
}

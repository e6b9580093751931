//! An in-memory adapter test double, used by the `advault-engine`/
//! `advault-saga`/`advault-dispute`/`advault-workers` test suites in
//! place of a real Telegram/YouTube/Twitter integration (those are out
//! of scope for the core).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use advault_core::types::{AdFormatType, PlatformTag};

use crate::adapter::{AdminCapableAdapter, ChannelInfo, ParsedPostUrl, PlatformAdapter, PostMetrics};
use crate::error::PlatformError;

/// A deterministic, fully in-memory `PlatformAdapter` for tests. URLs take
/// the shape `https://mock/<platform_channel_id>/<post_id>`.
pub struct MockPlatformAdapter {
    tag: PlatformTag,
    next_post_id: AtomicU64,
    metrics: Mutex<HashMap<String, PostMetrics>>,
    post_exists_override: Mutex<HashMap<String, bool>>,
    admins: Mutex<HashMap<String, Vec<String>>>,
    channel_info: Mutex<ChannelInfo>,
}

impl MockPlatformAdapter {
    pub fn new(tag: PlatformTag) -> Self {
        Self {
            tag,
            next_post_id: AtomicU64::new(1),
            metrics: Mutex::new(HashMap::new()),
            post_exists_override: Mutex::new(HashMap::new()),
            admins: Mutex::new(HashMap::new()),
            channel_info: Mutex::new(ChannelInfo {
                title: "Mock Channel".into(),
                subscribers: 10_000,
                avg_views: 1_000,
                premium_fraction: 0.1,
                language_distribution: vec![("en".into(), 1.0)],
            }),
        }
    }

    /// Set the metrics a subsequent `fetch_post_metrics(post_url)` call returns.
    pub fn set_metrics(&self, post_url: &str, metrics: PostMetrics) {
        self.metrics.lock().unwrap().insert(post_url.to_string(), metrics);
    }

    /// Override whether `verify_post_exists(post_url)` reports the post as present.
    pub fn set_post_exists(&self, post_url: &str, exists: bool) {
        self.post_exists_override
            .lock()
            .unwrap()
            .insert(post_url.to_string(), exists);
    }

    pub fn set_admins(&self, platform_channel_id: &str, admins: Vec<String>) {
        self.admins
            .lock()
            .unwrap()
            .insert(platform_channel_id.to_string(), admins);
    }

    pub fn set_channel_info(&self, info: ChannelInfo) {
        *self.channel_info.lock().unwrap() = info;
    }

    pub fn platform_tag(&self) -> &PlatformTag {
        &self.tag
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatformAdapter {
    async fn fetch_channel_info(&self, _platform_channel_id: &str) -> Result<ChannelInfo, PlatformError> {
        Ok(self.channel_info.lock().unwrap().clone())
    }

    fn can_post(&self, _format_type: AdFormatType) -> bool {
        true
    }

    async fn publish_post(
        &self,
        platform_channel_id: &str,
        _text: &str,
        _media_url: Option<&str>,
    ) -> Result<String, PlatformError> {
        let id = self.next_post_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{id}", platform_channel_id))
    }

    async fn verify_post_exists(&self, post_url: &str) -> Result<bool, PlatformError> {
        Ok(self
            .post_exists_override
            .lock()
            .unwrap()
            .get(post_url)
            .copied()
            .unwrap_or(true))
    }

    async fn fetch_post_metrics(&self, post_url: &str) -> Result<PostMetrics, PlatformError> {
        Ok(self
            .metrics
            .lock()
            .unwrap()
            .get(post_url)
            .cloned()
            .unwrap_or(PostMetrics {
                exists: true,
                ..Default::default()
            }))
    }

    fn parse_post_url(&self, url: &str) -> Result<ParsedPostUrl, PlatformError> {
        let rest = url
            .strip_prefix("https://mock/")
            .ok_or_else(|| PlatformError::UnparseableUrl(url.to_string()))?;
        let mut parts = rest.splitn(2, '/');
        let channel = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PlatformError::UnparseableUrl(url.to_string()))?;
        let post_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PlatformError::UnparseableUrl(url.to_string()))?;
        Ok(ParsedPostUrl {
            platform_channel_id: channel.to_string(),
            post_id: post_id.to_string(),
        })
    }

    fn get_post_url(&self, platform_channel_id: &str, post_id: &str) -> String {
        format!("https://mock/{platform_channel_id}/{post_id}")
    }

    fn get_channel_url(&self, platform_channel_id: &str) -> String {
        format!("https://mock/{platform_channel_id}")
    }
}

#[async_trait]
impl AdminCapableAdapter for MockPlatformAdapter {
    async fn verify_user_admin(
        &self,
        platform_channel_id: &str,
        external_user_id: &str,
    ) -> Result<bool, PlatformError> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .get(platform_channel_id)
            .map(|list| list.iter().any(|a| a == external_user_id))
            .unwrap_or(false))
    }

    async fn fetch_admins(&self, platform_channel_id: &str) -> Result<Vec<String>, PlatformError> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .get(platform_channel_id)
            .cloned()
            .unwrap_or_default())
    }
}

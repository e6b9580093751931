//! Platform-tag → adapter registry.
//!
//! Populated at startup and read-only thereafter: a `HashMap`-backed
//! registry with typed lookup, no locking needed once wiring completes.

use std::collections::HashMap;
use std::sync::Arc;

use advault_core::types::PlatformTag;

use crate::adapter::{AdminCapableAdapter, PlatformAdapter};
use crate::error::PlatformError;

struct AdapterEntry {
    adapter: Arc<dyn PlatformAdapter>,
    admin: Option<Arc<dyn AdminCapableAdapter>>,
}

#[derive(Default)]
pub struct AdapterRegistry {
    entries: HashMap<PlatformTag, AdapterEntry>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the required adapter for a platform tag.
    pub fn register(&mut self, tag: PlatformTag, adapter: Arc<dyn PlatformAdapter>) {
        self.entries.insert(tag, AdapterEntry { adapter, admin: None });
    }

    /// Attach the optional admin-discovery capability to an already
    /// registered platform tag. No-op if `register` wasn't called first —
    /// the required adapter is always registered via the same concrete
    /// value before its admin-capable view is attached.
    pub fn register_admin_capable(&mut self, tag: PlatformTag, admin: Arc<dyn AdminCapableAdapter>) {
        if let Some(entry) = self.entries.get_mut(&tag) {
            entry.admin = Some(admin);
        }
    }

    pub fn get(&self, tag: &PlatformTag) -> Result<Arc<dyn PlatformAdapter>, PlatformError> {
        self.entries
            .get(tag)
            .map(|e| e.adapter.clone())
            .ok_or_else(|| PlatformError::AdapterMissing(tag.to_string()))
    }

    pub fn get_admin_capable(&self, tag: &PlatformTag) -> Option<Arc<dyn AdminCapableAdapter>> {
        self.entries.get(tag).and_then(|e| e.admin.clone())
    }

    pub fn is_registered(&self, tag: &PlatformTag) -> bool {
        self.entries.contains_key(tag)
    }
}

//! Process-wide render cache.
//!
//! # Responsibilities
//! - Map a cache key to the assembled document of its first render
//! - Count hits and misses
//!
//! # Design Decisions
//! - Read-mostly, last-writer-wins; DashMap shards keep concurrent
//!   writes from corrupting entries but nothing prevents two first
//!   requests for the same key from both building
//! - No eviction, no TTL: bounded by distinct component × URL pairs
//! - Props are not part of the key, so a second render of the same
//!   component and URL with other props gets the first document

use std::sync::Arc;

use dashmap::DashMap;

use crate::observability::metrics;
use crate::render::component::CacheKey;
use crate::render::markup::Node;

/// Shared cache of assembled documents.
#[derive(Clone, Debug, Default)]
pub struct RenderCache {
    inner: Arc<DashMap<CacheKey, Arc<Node>>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously assembled document.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Node>> {
        let hit = self.inner.get(key).map(|entry| entry.value().clone());
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Store an assembled document, replacing any previous one.
    pub fn put(&self, key: CacheKey, document: Arc<Node>) {
        self.inner.insert(key, document);
        metrics::record_cache_size(self.inner.len());
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

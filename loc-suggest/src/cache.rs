//! Optional cache-aside layer for raw suggest2 hits.
//!
//! Entries are keyed by (mode, normalised query, authority type id) and
//! hold the hit list one retrieval mode returned. A cache only affects
//! latency: entries may vanish at any moment and the retriever simply
//! fetches again. [`MokaHitCache`] is the bundled implementation, built
//! on [`moka`] with a TTL and capacity bound.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::types::{CandidateHit, SearchMode};

/// Default maximum number of cached hit lists.
pub const DEFAULT_MAX_ENTRIES: u64 = 1_000;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    mode: SearchMode,
    /// Query exactly as sent to the remote service (already normalised).
    query: String,
    authority_id: String,
}

impl CacheKey {
    pub fn new(mode: SearchMode, query: &str, authority_id: &str) -> Self {
        Self {
            mode,
            query: query.to_owned(),
            authority_id: authority_id.to_owned(),
        }
    }
}

/// A pluggable store for per-mode hit lists.
#[async_trait]
pub trait HitCache: Send + Sync {
    /// Returns `Some(hits)` on a hit, `None` on a miss.
    async fn get(&self, key: &CacheKey) -> Option<Vec<CandidateHit>>;

    /// Store the hits a successful fetch returned.
    async fn insert(&self, key: CacheKey, hits: Vec<CandidateHit>);
}

/// In-memory TTL cache backed by moka.
#[derive(Clone)]
pub struct MokaHitCache {
    inner: Cache<CacheKey, Vec<CandidateHit>>,
}

impl MokaHitCache {
    /// Create a cache holding at most `max_entries` hit lists for `ttl_seconds` each.
    pub fn new(ttl_seconds: u64, max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        Self { inner }
    }
}

impl Default for MokaHitCache {
    fn default() -> Self {
        Self::new(3_600, DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl HitCache for MokaHitCache {
    async fn get(&self, key: &CacheKey) -> Option<Vec<CandidateHit>> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: CacheKey, hits: Vec<CandidateHit>) {
        self.inner.insert(key, hits).await;
    }
}

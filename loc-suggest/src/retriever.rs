//! Candidate retrieval from the suggest2 API.
//!
//! Each lookup issues one left-anchored and one keyword request for the
//! same normalised query, concurrently, and merges the hit lists into a
//! single pool without deduplication. Remote failures never propagate:
//! they are logged, and the pool built up to the failed mode is returned.

use std::sync::Arc;

use crate::cache::{CacheKey, HitCache};
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::http;
use crate::types::{AuthorityType, CandidateHit, SearchMode, SuggestResponse};

/// A source of raw candidate hits for one retrieval mode.
///
/// [`SuggestClient`] is the production implementation; tests substitute
/// canned sources. Implementations must be `Send + Sync` because both
/// modes are fetched concurrently.
pub trait CandidateSource: Send + Sync {
    /// Fetch the hits for `query` (already normalised) in `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if the request cannot be sent, times out,
    /// answers with an error status, or the body is not suggest2 JSON.
    fn fetch(
        &self,
        mode: SearchMode,
        query: &str,
        authority: &AuthorityType,
    ) -> impl std::future::Future<Output = Result<Vec<CandidateHit>, ReconcileError>> + Send;
}

/// reqwest-backed client for `<base>/<index>/suggest2/`.
#[derive(Debug, Clone)]
pub struct SuggestClient {
    client: reqwest::Client,
    base_url: String,
    collection_base: String,
}

impl SuggestClient {
    /// Build a client from the matching configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ReconcileConfig) -> Result<Self, ReconcileError> {
        Ok(Self {
            client: http::build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            collection_base: config.collection_base.clone(),
        })
    }

    /// Full request URL for one mode.
    pub fn suggest_url(&self, mode: SearchMode, query: &str, authority: &AuthorityType) -> String {
        format!(
            "{}{}/suggest2/?searchtype={}&memberOf={}&q={}",
            self.base_url,
            authority.index,
            mode.as_str(),
            urlencoding::encode(&authority.collection_uri(&self.collection_base)),
            urlencoding::encode(query),
        )
    }
}

impl CandidateSource for SuggestClient {
    async fn fetch(
        &self,
        mode: SearchMode,
        query: &str,
        authority: &AuthorityType,
    ) -> Result<Vec<CandidateHit>, ReconcileError> {
        let url = self.suggest_url(mode, query, authority);
        tracing::debug!(%url, "suggest2 request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify_transport_error(mode, e))?
            .error_for_status()
            .map_err(|e| ReconcileError::Http(format!("suggest2 {mode} HTTP error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(mode, e))?;

        let parsed: SuggestResponse = serde_json::from_str(&body)
            .map_err(|e| ReconcileError::Parse(format!("suggest2 {mode} body: {e}")))?;

        tracing::trace!(%mode, count = parsed.hits.len(), "suggest2 hits received");
        Ok(parsed.hits)
    }
}

fn classify_transport_error(mode: SearchMode, e: reqwest::Error) -> ReconcileError {
    if e.is_timeout() {
        ReconcileError::Timeout(format!("suggest2 {mode} request: {e}"))
    } else {
        ReconcileError::Http(format!("suggest2 {mode} request failed: {e}"))
    }
}

/// Dual-mode retriever with an optional cache-aside layer.
pub struct Retriever<S> {
    source: S,
    cache: Option<Arc<dyn HitCache>>,
}

impl<S: CandidateSource> Retriever<S> {
    /// Retriever without a cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// Attach a hit cache. Callers of [`Retriever::retrieve`] are unaffected.
    pub fn with_cache(mut self, cache: Arc<dyn HitCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Retrieve the merged hit pool for `query` against `authority`.
    ///
    /// # Pipeline
    ///
    /// 1. Run every [`SearchMode`] concurrently (cache first, then remote)
    /// 2. Append hits in mode order
    /// 3. Stop appending at the first failed mode, logging the error
    ///
    /// A blank query returns an empty pool without any remote call.
    pub async fn retrieve(&self, query: &str, authority: &AuthorityType) -> Vec<CandidateHit> {
        if query.is_empty() {
            tracing::debug!(authority = %authority.id, "blank query, skipping retrieval");
            return Vec::new();
        }

        let futures: Vec<_> = SearchMode::all()
            .iter()
            .map(|&mode| async move { (mode, self.fetch_mode(mode, query, authority).await) })
            .collect();

        let outcomes = futures::future::join_all(futures).await;

        let mut pool: Vec<CandidateHit> = Vec::new();
        for (mode, outcome) in outcomes {
            match outcome {
                Ok(hits) => {
                    tracing::debug!(%mode, count = hits.len(), "mode returned hits");
                    pool.extend(hits);
                }
                Err(err) => {
                    tracing::warn!(
                        %mode,
                        authority = %authority.id,
                        error = %err,
                        "suggest2 retrieval failed, keeping partial pool"
                    );
                    break;
                }
            }
        }
        pool
    }

    async fn fetch_mode(
        &self,
        mode: SearchMode,
        query: &str,
        authority: &AuthorityType,
    ) -> Result<Vec<CandidateHit>, ReconcileError> {
        let key = CacheKey::new(mode, query, &authority.id);
        if let Some(cache) = &self.cache {
            if let Some(hits) = cache.get(&key).await {
                tracing::trace!(%mode, "hit cache hit");
                return Ok(hits);
            }
        }

        let hits = self.source.fetch(mode, query, authority).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, hits.clone()).await;
        }
        Ok(hits)
    }
}

//! # loc-suggest
//!
//! Matching and ranking core for reconciling free-text labels against the
//! Library of Congress authority files (names, subject headings,
//! genre/form terms) through the id.loc.gov `suggest2` API.
//!
//! ## Design
//!
//! - Queries are normalised once (diacritics folded, lowercased, whitespace
//!   collapsed) and that form feeds both retrieval and scoring; remote
//!   labels get the same diacritic folding when scored
//! - Each lookup runs a left-anchored and a keyword search concurrently and
//!   pools the hits
//! - Hits are scored with a word-order-independent similarity (0–100);
//!   scores above the configured threshold are flagged as matches
//! - A subdivision record shadowing an identically labelled main heading
//!   is dropped from the top spot, and the list is capped (3 by default)
//! - Batches fan out with bounded concurrency
//! - Remote failures degrade to partial or empty results, never errors
//! - An optional cache-aside layer ([`cache::HitCache`]) saves repeat calls
//!
//! This is a library; the HTTP endpoint lives in the `loc-reconcile` crate.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod ranking;
pub mod reconcile;
pub mod retriever;
pub mod types;

pub use cache::{HitCache, MokaHitCache};
pub use catalog::AuthorityCatalog;
pub use config::ReconcileConfig;
pub use error::{ReconcileError, Result};
pub use reconcile::{
    QueryResult, ReconcileRequest, ReconcileResponse, Reconciler, ServiceInfo, ServiceMetadata,
};
pub use retriever::{CandidateSource, Retriever, SuggestClient};
pub use types::{AuthorityType, CandidateHit, Query, ScoredCandidate, SearchMode, TypeSummary};

/// Reconcile one label against one authority type.
///
/// Builds an uncached [`Reconciler`] for `config` and runs the full
/// pipeline. Unknown type ids fall back to the configured default type.
///
/// # Errors
///
/// Returns [`ReconcileError::Config`] if `config` is invalid. Remote
/// failures are not errors: they yield fewer (or no) candidates.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> loc_suggest::Result<()> {
/// let config = loc_suggest::ReconcileConfig::default();
/// let candidates = loc_suggest::lookup("Twain, Mark, 1835-1910", "Names", &config).await?;
/// for c in &candidates {
///     println!("{} {} ({})", c.score, c.name, c.id);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn lookup(
    query: &str,
    authority_type: &str,
    config: &ReconcileConfig,
) -> Result<Vec<ScoredCandidate>> {
    let reconciler = Reconciler::from_config(config.clone(), ServiceInfo::default())?;
    Ok(reconciler.search(query, authority_type, None).await)
}

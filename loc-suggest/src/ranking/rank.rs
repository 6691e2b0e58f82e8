//! Score, threshold, order, collapse and cap a candidate pool.

use crate::config::ReconcileConfig;
use crate::types::{AuthorityType, CandidateHit, ScoredCandidate};

use super::collapse::collapse_subdivision;
use super::similarity::score_hit;

/// Whether `score` clears the confidence `threshold` (strictly greater).
pub fn is_confident_match(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Turn one hit into a scored candidate for `query`.
pub fn score_candidate(
    query: &str,
    hit: &CandidateHit,
    authority: &AuthorityType,
    threshold: f64,
) -> ScoredCandidate {
    let score = score_hit(query, hit);
    tracing::trace!(label = %hit.a_label, score, uri = %hit.uri, "scored hit");
    ScoredCandidate {
        id: hit.uri.clone(),
        name: hit.a_label.clone(),
        score,
        is_match: is_confident_match(score, threshold),
        types: vec![authority.summary()],
    }
}

/// Rank a hit pool against an already-normalised query.
///
/// # Pipeline
///
/// 1. Score every hit (best of authorized and variant label)
/// 2. Flag scores above `config.confidence_threshold` as matches
/// 3. Stable sort by score, descending (ties keep retrieval order)
/// 4. Collapse a top-ranked subdivision shadowing an identical runner-up
/// 5. Truncate to `config.max_candidates`
///
/// The query is not normalised again here.
pub fn rank(
    query: &str,
    hits: &[CandidateHit],
    authority: &AuthorityType,
    config: &ReconcileConfig,
) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = hits
        .iter()
        .map(|hit| score_candidate(query, hit, authority, config.confidence_threshold))
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if candidates.is_empty() {
        return candidates;
    }

    collapse_subdivision(&mut candidates, &config.subdivision_markers);
    candidates.truncate(config.max_candidates);
    candidates
}

//! Subdivision collapse for the top-ranked candidate.
//!
//! Free-floating subdivision records (`sh99...` identifiers, or
//! `...-781` geographic subdivision forms) often carry the same label as
//! the main heading they qualify. When such a record wins the ranking and
//! the runner-up has the identical label, the runner-up is the heading
//! the caller wants, so the subdivision record is dropped.

use crate::types::ScoredCandidate;

/// Whether `id` carries any of the subdivision `markers`.
pub fn is_subdivision_id(id: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| !marker.is_empty() && id.contains(marker.as_str()))
}

/// Drop the top candidate if it is a subdivision shadowing the runner-up.
///
/// Only index 0 is compared with index 1, and only index 0 can be removed.
/// `candidates` must already be sorted. Returns `true` if a candidate was removed.
pub fn collapse_subdivision(candidates: &mut Vec<ScoredCandidate>, markers: &[String]) -> bool {
    if candidates.len() < 2 {
        return false;
    }
    if !is_subdivision_id(&candidates[0].id, markers) {
        return false;
    }
    if candidates[1].name != candidates[0].name {
        return false;
    }

    let dropped = candidates.remove(0);
    tracing::debug!(id = %dropped.id, name = %dropped.name, "collapsed subdivision heading");
    true
}

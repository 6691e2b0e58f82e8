//! Token-sort string similarity on a 0–100 scale.
//!
//! Both strings are folded (compatibility forms and diacritics), reduced
//! to lowercase alphanumeric tokens, and the tokens are sorted and
//! re-joined. The two sorted forms are compared with the indel ratio
//! from `rapidfuzz`, scaled to 100 and rounded half to even, so
//! `"Twain, Mark"` and `"mark twain"` score 100.

use rapidfuzz::fuzz;

use crate::normalize::fold;
use crate::types::CandidateHit;

/// Score of a string pair where either side has no tokens.
const EMPTY_SCORE: f64 = 0.0;

/// Reduce `text` to space-separated lowercase tokens, sorted.
///
/// Diacritics are dropped first. Every character that is neither
/// alphanumeric nor `_` acts as a separator.
pub fn sorted_tokens(text: &str) -> String {
    let cleaned: String = fold(text)
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .to_lowercase();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Word-order-independent similarity of `a` and `b`, 0 to 100 in whole points.
///
/// Returns 0 when either side has no tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if a.is_empty() || b.is_empty() {
        return EMPTY_SCORE;
    }
    (100.0 * fuzz::ratio(a.chars(), b.chars())).round_ties_even()
}

/// Best score of `query` against the authorized and variant labels of a hit.
pub fn score_hit(query: &str, hit: &CandidateHit) -> f64 {
    token_sort_ratio(query, &hit.a_label).max(token_sort_ratio(query, &hit.v_label))
}

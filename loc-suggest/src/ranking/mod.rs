//! Scoring and ranking: token-sort similarity, confidence threshold,
//! ordering, subdivision collapse and the result cap.

pub mod collapse;
pub mod rank;
pub mod similarity;

pub use rank::{is_confident_match, rank};

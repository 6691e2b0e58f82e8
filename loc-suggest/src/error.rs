//! Error types for the loc-suggest crate.
//!
//! Remote failures are recoverable by design of the pipeline: the
//! retriever logs them and keeps whatever hits it already has. Only
//! [`ReconcileError::InvalidRequest`] is meant to reach a caller.

/// Errors that can occur while retrieving, ranking or reconciling.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The suggest service could not be reached or answered with an error status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A suggest request exceeded the per-call timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The suggest service answered with a body that is not the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid matching configuration or authority catalog.
    #[error("config error: {0}")]
    Config(String),

    /// The caller's `queries`/`query` payload could not be decoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenience type alias for loc-suggest results.
pub type Result<T> = std::result::Result<T, ReconcileError>;

//! Shared HTTP client for suggest2 requests.

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use std::time::Duration;

/// User-Agent sent when the configuration does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("loc-suggest/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for the suggest service.
///
/// The client has:
/// - Per-request timeout from config
/// - The configured User-Agent, or [`DEFAULT_USER_AGENT`]
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`ReconcileError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ReconcileConfig) -> Result<reqwest::Client, ReconcileError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ReconcileError::Http(format!("failed to build HTTP client: {e}")))
}

//! Matching configuration with sensible defaults.
//!
//! [`ReconcileConfig`] holds the remote endpoint settings, the authority
//! catalog entries and every ranking constant (confidence threshold,
//! result cap, subdivision markers) so they can be tuned without touching
//! the scoring code.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::AuthorityCatalog;
use crate::error::ReconcileError;
use crate::types::AuthorityType;

/// Scores strictly above this value are flagged as confident matches.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 95.0;

/// Maximum number of candidates returned per query.
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// Batch items reconciled at the same time.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

/// Identifier fragments that mark a subdivision heading.
pub const DEFAULT_SUBDIVISION_MARKERS: &[&str] = &["sh990", "-781"];

/// Configuration for retrieval and ranking.
///
/// Use [`Default::default()`] for the id.loc.gov setup, or override fields
/// (typically from the service's TOML file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Scheme and host of the suggest service, without trailing slash.
    pub base_url: String,
    /// Prefix of the `memberOf` collection URI; the abbreviation and
    /// `AuthorizedHeadings` are appended.
    pub collection_base: String,
    /// Per-call HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent. `None` uses the crate's own identifier.
    pub user_agent: Option<String>,
    /// Scores strictly above this are confident matches.
    pub confidence_threshold: f64,
    /// Result cap applied after the subdivision collapse.
    pub max_candidates: usize,
    /// Identifier substrings that mark a subdivision heading.
    pub subdivision_markers: Vec<String>,
    /// Type id used when a query names an unknown type.
    pub default_type: String,
    /// Authority vocabularies, in the order they are advertised.
    pub authorities: Vec<AuthorityType>,
    /// Upper bound on batch items in flight; each runs one request per
    /// search mode.
    pub max_concurrent_queries: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            base_url: "https://id.loc.gov".to_owned(),
            collection_base: "http://id.loc.gov/authorities/names/collection_".to_owned(),
            timeout_seconds: 8,
            user_agent: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            subdivision_markers: DEFAULT_SUBDIVISION_MARKERS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
            default_type: "Names".to_owned(),
            authorities: default_authorities(),
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }
}

/// The three Library of Congress vocabularies served out of the box.
pub fn default_authorities() -> Vec<AuthorityType> {
    vec![
        AuthorityType::new(
            "Names",
            "Library of Congress Name Authority File",
            "/authorities/names",
            "Names",
        ),
        AuthorityType::new(
            "Subjects",
            "Library of Congress Subject Headings",
            "/authorities/subjects",
            "LCSH",
        ),
        AuthorityType::new(
            "Genre/Form Terms",
            "Library of Congress Genre/Form Terms",
            "/authorities/genreForms",
            "LCGFT",
        ),
    ]
}

impl ReconcileConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_candidates` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `max_concurrent_queries` must be greater than 0
    /// - `confidence_threshold` must lie within 0..=100
    /// - `base_url` must parse as an absolute URL
    /// - the authority list must form a valid catalog
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.max_candidates == 0 {
            return Err(ReconcileError::Config(
                "max_candidates must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ReconcileError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_concurrent_queries == 0 {
            return Err(ReconcileError::Config(
                "max_concurrent_queries must be greater than 0".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(ReconcileError::Config(
                "confidence_threshold must be between 0 and 100".into(),
            ));
        }
        Url::parse(&self.base_url)
            .map_err(|e| ReconcileError::Config(format!("invalid base_url: {e}")))?;
        AuthorityCatalog::from_config(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = ReconcileConfig::default();
        assert_eq!(config.max_candidates, 3);
        assert_eq!(config.timeout_seconds, 8);
        assert!((config.confidence_threshold - 95.0).abs() < f64::EPSILON);
        assert_eq!(config.subdivision_markers, vec!["sh990", "-781"]);
        assert_eq!(config.default_type, "Names");
        assert!(config.user_agent.is_none());
        assert_eq!(config.max_concurrent_queries, 4);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = ReconcileConfig {
            max_concurrent_queries: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_concurrent_queries"));
    }

    #[test]
    fn default_authorities_are_the_three_lc_vocabularies() {
        let ids: Vec<String> = default_authorities().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["Names", "Subjects", "Genre/Form Terms"]);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(ReconcileConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_candidates_rejected() {
        let config = ReconcileConfig {
            max_candidates: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_candidates"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ReconcileConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let config = ReconcileConfig {
            confidence_threshold: 101.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn relative_base_url_rejected() {
        let config = ReconcileConfig {
            base_url: "id.loc.gov".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn unknown_default_type_rejected() {
        let config = ReconcileConfig {
            default_type: "Places".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Places"));
    }

    #[test]
    fn partial_toml_style_overrides_keep_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"max_candidates":5}"#).expect("deserialize");
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.authorities.len(), 3);
        assert!(config.validate().is_ok());
    }
}

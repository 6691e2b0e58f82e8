//! Batch orchestration and service self-description.
//!
//! [`Reconciler`] drives the per-query pipeline (resolve type → normalise
//! → retrieve → rank) for single and batched requests and produces the
//! service metadata document when a client asks for discovery.
//!
//! A batch containing any item without a `type` is answered with the
//! service metadata in place of results. This mirrors the discovery
//! behaviour of an empty request at batch granularity.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::cache::HitCache;
use crate::catalog::AuthorityCatalog;
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::normalize::normalize;
use crate::ranking::rank;
use crate::retriever::{CandidateSource, Retriever, SuggestClient};
use crate::types::{Query, ScoredCandidate, TypeSummary};

/// Descriptive fields of the metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    pub name: String,
    pub identifier_space: String,
    pub schema_space: String,
    /// Entity view URL template; must contain `{{id}}`.
    pub view_url: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "LoC Reconciliation Service".to_owned(),
            identifier_space: "http://localhost/identifier".to_owned(),
            schema_space: "http://localhost/schema".to_owned(),
            view_url: "{{id}}".to_owned(),
        }
    }
}

/// Service metadata document returned on discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub name: String,
    pub default_types: Vec<TypeSummary>,
    pub identifier_space: String,
    pub schema_space: String,
    pub view: ViewTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTemplate {
    pub url: String,
}

/// Results for one query key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub result: Vec<ScoredCandidate>,
}

/// A decoded reconciliation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileRequest {
    /// No parameters: the caller wants the service metadata.
    Describe,
    /// The `query` parameter.
    Single(Query),
    /// The `queries` parameter: caller key → query.
    Batch(BTreeMap<String, Query>),
}

impl ReconcileRequest {
    /// Decode the raw `queries` and `query` request parameters.
    ///
    /// `queries` wins when both are present. Empty values count as absent.
    /// A `query` value that is not a JSON object is taken as a bare label
    /// with no type.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidRequest`] if `queries` is not a JSON
    /// object of queries, or `query` looks like JSON but does not decode.
    pub fn from_params(queries: Option<&str>, query: Option<&str>) -> Result<Self, ReconcileError> {
        if let Some(raw) = queries.map(str::trim).filter(|s| !s.is_empty()) {
            return parse_batch(raw).map(Self::Batch);
        }
        if let Some(raw) = query.map(str::trim).filter(|s| !s.is_empty()) {
            return parse_single(raw).map(Self::Single);
        }
        Ok(Self::Describe)
    }
}

/// Decode a `queries` payload.
pub fn parse_batch(raw: &str) -> Result<BTreeMap<String, Query>, ReconcileError> {
    serde_json::from_str(raw)
        .map_err(|e| ReconcileError::InvalidRequest(format!("malformed queries: {e}")))
}

/// Decode a `query` payload, accepting a bare string label.
pub fn parse_single(raw: &str) -> Result<Query, ReconcileError> {
    if raw.starts_with('{') {
        serde_json::from_str(raw)
            .map_err(|e| ReconcileError::InvalidRequest(format!("malformed query: {e}")))
    } else {
        Ok(Query::untyped(raw))
    }
}

/// A reconciliation answer, serialised in the OpenRefine response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReconcileResponse {
    Metadata(ServiceMetadata),
    Single(QueryResult),
    Batch(BTreeMap<String, QueryResult>),
}

/// Matching pipeline bound to a catalog, a candidate source and a config.
pub struct Reconciler<S> {
    catalog: AuthorityCatalog,
    retriever: Retriever<S>,
    config: ReconcileConfig,
    info: ServiceInfo,
}

impl Reconciler<SuggestClient> {
    /// Reconciler that queries the suggest2 service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] for an invalid configuration, or
    /// [`ReconcileError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: ReconcileConfig, info: ServiceInfo) -> Result<Self, ReconcileError> {
        let client = SuggestClient::new(&config)?;
        Self::new(config, client, info)
    }
}

impl<S: CandidateSource> Reconciler<S> {
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if `config` fails validation.
    pub fn new(config: ReconcileConfig, source: S, info: ServiceInfo) -> Result<Self, ReconcileError> {
        config.validate()?;
        let catalog = AuthorityCatalog::from_config(&config)?;
        Ok(Self {
            catalog,
            retriever: Retriever::new(source),
            config,
            info,
        })
    }

    /// Attach a hit cache to the retriever.
    pub fn with_cache(mut self, cache: Arc<dyn HitCache>) -> Self {
        self.retriever = self.retriever.with_cache(cache);
        self
    }

    /// The metadata document; `defaultTypes` mirrors the catalog.
    pub fn metadata(&self) -> ServiceMetadata {
        ServiceMetadata {
            name: self.info.name.clone(),
            default_types: self.catalog.list_types(),
            identifier_space: self.info.identifier_space.clone(),
            schema_space: self.info.schema_space.clone(),
            view: ViewTemplate {
                url: self.info.view_url.clone(),
            },
        }
    }

    /// Run the pipeline for one label against one type id.
    ///
    /// Unknown type ids fall back to the catalog default. `limit` can only
    /// lower the configured cap.
    pub async fn search(
        &self,
        raw_query: &str,
        type_id: &str,
        limit: Option<usize>,
    ) -> Vec<ScoredCandidate> {
        let authority = self.catalog.resolve(type_id);
        let query = normalize(raw_query);
        let hits = self.retriever.retrieve(&query, authority).await;
        let mut ranked = rank(&query, &hits, authority, &self.config);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }

    /// Answer a decoded request.
    pub async fn reconcile(&self, request: ReconcileRequest) -> ReconcileResponse {
        match request {
            ReconcileRequest::Describe => ReconcileResponse::Metadata(self.metadata()),
            ReconcileRequest::Single(query) => match query.authority_type.as_deref() {
                None => ReconcileResponse::Metadata(self.metadata()),
                Some(type_id) => ReconcileResponse::Single(QueryResult {
                    result: self.search(&query.query, type_id, query.limit).await,
                }),
            },
            ReconcileRequest::Batch(queries) => self.reconcile_batch(queries).await,
        }
    }

    async fn reconcile_batch(&self, queries: BTreeMap<String, Query>) -> ReconcileResponse {
        if let Some(key) = queries
            .iter()
            .find(|(_, q)| q.authority_type.is_none())
            .map(|(k, _)| k)
        {
            tracing::info!(%key, "batch item without type, answering with service metadata");
            return ReconcileResponse::Metadata(self.metadata());
        }

        tracing::debug!(count = queries.len(), "reconciling batch");

        let results: BTreeMap<String, QueryResult> = stream::iter(queries)
            .map(|(key, query)| async move {
                let type_id = query.authority_type.as_deref().unwrap_or_default();
                let result = self.search(&query.query, type_id, query.limit).await;
                (key, QueryResult { result })
            })
            .buffer_unordered(self.config.max_concurrent_queries)
            .collect()
            .await;
        ReconcileResponse::Batch(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{AuthorityType, CandidateHit, SearchMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every mode with hits derived from the authority's index.
    struct EchoSource;

    impl CandidateSource for EchoSource {
        async fn fetch(
            &self,
            mode: SearchMode,
            query: &str,
            authority: &AuthorityType,
        ) -> Result<Vec<CandidateHit>> {
            Ok(vec![CandidateHit::new(
                &format!("http://id.loc.gov{}/{}-{mode}", authority.index, query.len()),
                query,
                "",
            )])
        }
    }

    /// Answers left-anchored searches with one hit carrying a raw label.
    struct LabelSource(&'static str);

    impl CandidateSource for LabelSource {
        async fn fetch(
            &self,
            mode: SearchMode,
            _query: &str,
            authority: &AuthorityType,
        ) -> Result<Vec<CandidateHit>> {
            Ok(match mode {
                SearchMode::LeftAnchored => vec![CandidateHit::new(
                    &format!("http://id.loc.gov{}/n79021215", authority.index),
                    self.0,
                    "",
                )],
                SearchMode::Keyword => vec![],
            })
        }
    }

    /// Records the highest number of fetches in flight at once.
    #[derive(Default)]
    struct CountingSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CandidateSource for CountingSource {
        async fn fetch(
            &self,
            _mode: SearchMode,
            query: &str,
            _authority: &AuthorityType,
        ) -> Result<Vec<CandidateHit>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![CandidateHit::new("u", query, "")])
        }
    }

    fn batch_of(n: usize) -> BTreeMap<String, Query> {
        (0..n)
            .map(|i| (format!("q{i}"), Query::new(&format!("heading {i}"), "Subjects")))
            .collect()
    }

    fn reconciler() -> Reconciler<EchoSource> {
        Reconciler::new(ReconcileConfig::default(), EchoSource, ServiceInfo::default())
            .expect("valid config")
    }

    #[test]
    fn from_params_without_values_describes() {
        assert_eq!(
            ReconcileRequest::from_params(None, None).expect("ok"),
            ReconcileRequest::Describe
        );
        assert_eq!(
            ReconcileRequest::from_params(Some(""), Some("  ")).expect("ok"),
            ReconcileRequest::Describe
        );
    }

    #[test]
    fn from_params_prefers_queries() {
        let req = ReconcileRequest::from_params(
            Some(r#"{"q0":{"query":"Twain","type":"Names"}}"#),
            Some("ignored"),
        )
        .expect("ok");
        match req {
            ReconcileRequest::Batch(map) => assert_eq!(map["q0"].query, "Twain"),
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn malformed_queries_is_an_invalid_request() {
        let err = ReconcileRequest::from_params(Some("{not json"), None).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRequest(_)));
        let err = ReconcileRequest::from_params(Some(r#"["a","b"]"#), None).unwrap_err();
        assert!(err.to_string().contains("malformed queries"));
    }

    #[test]
    fn bare_single_query_is_untyped() {
        let req = ReconcileRequest::from_params(None, Some("Mark Twain")).expect("ok");
        assert_eq!(req, ReconcileRequest::Single(Query::untyped("Mark Twain")));
    }

    #[test]
    fn malformed_single_json_is_an_invalid_request() {
        let err = parse_single(r#"{"query": 12}"#).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRequest(_)));
    }

    #[test]
    fn metadata_lists_catalog_types() {
        let meta = reconciler().metadata();
        assert_eq!(meta.name, "LoC Reconciliation Service");
        assert_eq!(meta.default_types.len(), 3);
        assert_eq!(meta.default_types[2].id, "Genre/Form Terms");
        assert_eq!(meta.view.url, "{{id}}");
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let json = serde_json::to_value(reconciler().metadata()).expect("serialize");
        assert_eq!(json["identifierSpace"], "http://localhost/identifier");
        assert_eq!(json["schemaSpace"], "http://localhost/schema");
        assert_eq!(json["defaultTypes"][0]["id"], "Names");
        assert_eq!(
            json["defaultTypes"][0]["name"],
            "Library of Congress Name Authority File"
        );
        assert!(json["defaultTypes"][0].get("index").is_none());
    }

    #[tokio::test]
    async fn describe_returns_metadata() {
        let r = reconciler();
        let response = r.reconcile(ReconcileRequest::Describe).await;
        assert_eq!(response, ReconcileResponse::Metadata(r.metadata()));
    }

    #[tokio::test]
    async fn batch_routes_each_key_to_its_catalog() {
        let mut queries = BTreeMap::new();
        queries.insert("q1".to_owned(), Query::new("United States--History", "Subjects"));
        queries.insert("q2".to_owned(), Query::new("Film noir", "Genre/Form Terms"));

        let response = reconciler().reconcile(ReconcileRequest::Batch(queries)).await;
        let ReconcileResponse::Batch(map) = response else {
            panic!("expected batch response");
        };
        assert_eq!(map.len(), 2);
        assert!(map["q1"].result[0].id.contains("/authorities/subjects/"));
        assert_eq!(map["q1"].result[0].types[0].id, "Subjects");
        assert!(map["q2"].result[0].id.contains("/authorities/genreForms/"));
        for result in map.values() {
            assert!(result.result.len() <= 3);
        }
    }

    #[tokio::test]
    async fn batch_with_untyped_item_returns_metadata() {
        let mut queries = BTreeMap::new();
        queries.insert("q1".to_owned(), Query::new("Film noir", "Genre/Form Terms"));
        queries.insert("q2".to_owned(), Query::untyped("Mark Twain"));

        let r = reconciler();
        let response = r.reconcile(ReconcileRequest::Batch(queries)).await;
        assert_eq!(response, ReconcileResponse::Metadata(r.metadata()));
    }

    #[tokio::test]
    async fn empty_batch_is_an_empty_map() {
        let response = reconciler()
            .reconcile(ReconcileRequest::Batch(BTreeMap::new()))
            .await;
        assert_eq!(response, ReconcileResponse::Batch(BTreeMap::new()));
    }

    #[tokio::test]
    async fn untyped_single_query_returns_metadata() {
        let r = reconciler();
        let response = r
            .reconcile(ReconcileRequest::Single(Query::untyped("Mark Twain")))
            .await;
        assert_eq!(response, ReconcileResponse::Metadata(r.metadata()));
    }

    #[tokio::test]
    async fn unknown_type_uses_default_authority() {
        let result = reconciler().search("Mark Twain", "Corporate Names", None).await;
        assert!(result[0].id.contains("/authorities/names/"));
        assert_eq!(result[0].types[0].id, "Names");
    }

    #[tokio::test]
    async fn query_is_normalised_before_retrieval_and_scoring() {
        // EchoSource returns the normalised query as the label.
        let result = reconciler().search("  Brontë,   Charlotte ", "Names", None).await;
        assert_eq!(result[0].name, "bronte, charlotte");
        assert!(result[0].is_match);
    }

    #[tokio::test]
    async fn exact_label_with_diacritics_is_a_confident_match() {
        let r = Reconciler::new(
            ReconcileConfig::default(),
            LabelSource("Gödel, Kurt, 1906-1978"),
            ServiceInfo::default(),
        )
        .expect("valid config");
        let result = r.search("Gödel, Kurt, 1906-1978", "Names", None).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Gödel, Kurt, 1906-1978");
        assert!((result[0].score - 100.0).abs() < f64::EPSILON);
        assert!(result[0].is_match);
    }

    #[tokio::test]
    async fn batch_fan_out_is_bounded() {
        let config = ReconcileConfig {
            max_concurrent_queries: 1,
            ..Default::default()
        };
        let r = Reconciler::new(config, CountingSource::default(), ServiceInfo::default())
            .expect("valid config");
        let response = r.reconcile(ReconcileRequest::Batch(batch_of(4))).await;
        let ReconcileResponse::Batch(map) = response else {
            panic!("expected batch response");
        };
        assert_eq!(map.len(), 4);
        // One item at a time, two search modes each.
        assert_eq!(r.retriever.source().peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_fan_out_uses_the_configured_width() {
        let config = ReconcileConfig {
            max_concurrent_queries: 4,
            ..Default::default()
        };
        let r = Reconciler::new(config, CountingSource::default(), ServiceInfo::default())
            .expect("valid config");
        r.reconcile(ReconcileRequest::Batch(batch_of(6))).await;
        assert_eq!(r.retriever.source().peak.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn client_limit_lowers_the_cap() {
        let result = reconciler().search("Film noir", "Subjects", Some(1)).await;
        assert_eq!(result.len(), 1);
        let result = reconciler().search("Film noir", "Subjects", Some(10)).await;
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ReconcileConfig {
            max_candidates: 0,
            ..Default::default()
        };
        assert!(Reconciler::new(config, EchoSource, ServiceInfo::default()).is_err());
    }

    #[test]
    fn batch_response_serializes_keyed_results() {
        let mut map = BTreeMap::new();
        map.insert("q0".to_owned(), QueryResult { result: vec![] });
        let json = serde_json::to_string(&ReconcileResponse::Batch(map)).expect("serialize");
        assert_eq!(json, r#"{"q0":{"result":[]}}"#);
    }
}

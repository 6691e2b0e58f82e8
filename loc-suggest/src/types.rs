//! Core types for authority lookups, remote hits and ranked candidates.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One authority vocabulary the service can reconcile against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityType {
    /// Stable type identifier sent by clients, e.g. `"Names"`.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Remote index path below the suggest base URL, e.g. `/authorities/names`.
    pub index: String,
    /// Collection abbreviation used to build the `memberOf` URI, e.g. `LCSH`.
    pub coll_abbrev: String,
}

impl AuthorityType {
    /// Convenience constructor.
    pub fn new(id: &str, name: &str, index: &str, coll_abbrev: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            index: index.to_owned(),
            coll_abbrev: coll_abbrev.to_owned(),
        }
    }

    /// The `{id, name}` pair exposed to clients.
    pub fn summary(&self) -> TypeSummary {
        TypeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Full `memberOf` collection URI for this authority.
    pub fn collection_uri(&self, collection_base: &str) -> String {
        format!("{collection_base}{}AuthorizedHeadings", self.coll_abbrev)
    }
}

/// Public `{id, name}` view of an [`AuthorityType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub id: String,
    pub name: String,
}

/// A single reconciliation query as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Free-text label to reconcile.
    pub query: String,
    /// Requested authority type id. `None` means the caller wants metadata.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub authority_type: Option<String>,
    /// Optional client-side cap; can only lower the configured maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Query {
    /// Build a typed query.
    pub fn new(query: &str, authority_type: &str) -> Self {
        Self {
            query: query.to_owned(),
            authority_type: Some(authority_type.to_owned()),
            limit: None,
        }
    }

    /// Build a query that carries no authority type.
    pub fn untyped(query: &str) -> Self {
        Self {
            query: query.to_owned(),
            authority_type: None,
            limit: None,
        }
    }
}

/// One raw hit from the suggest2 API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateHit {
    pub uri: String,
    /// Authorized heading.
    #[serde(rename = "aLabel")]
    pub a_label: String,
    /// Variant label the query matched, empty when the hit matched the authorized form.
    #[serde(rename = "vLabel", default, deserialize_with = "null_as_empty")]
    pub v_label: String,
}

impl CandidateHit {
    pub fn new(uri: &str, a_label: &str, v_label: &str) -> Self {
        Self {
            uri: uri.to_owned(),
            a_label: a_label.to_owned(),
            v_label: v_label.to_owned(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Body of a suggest2 response. Other fields (`count`, `offset`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub hits: Vec<CandidateHit>,
}

/// A scored candidate in the reconciliation response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Authority URI.
    pub id: String,
    /// Authorized heading.
    pub name: String,
    /// Token-sort similarity, 0 to 100.
    pub score: f64,
    /// Whether the score clears the confidence threshold.
    #[serde(rename = "match")]
    pub is_match: bool,
    #[serde(rename = "type")]
    pub types: Vec<TypeSummary>,
}

/// Retrieval modes supported by the suggest2 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Labels that begin with the query.
    LeftAnchored,
    /// Labels that contain the query terms anywhere.
    Keyword,
}

impl SearchMode {
    /// Value of the `searchtype` URL parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftAnchored => "leftanchored",
            Self::Keyword => "keyword",
        }
    }

    /// All modes, in the order their hits are merged.
    pub fn all() -> &'static [SearchMode] {
        &[Self::LeftAnchored, Self::Keyword]
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

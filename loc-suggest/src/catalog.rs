//! Authority catalog: type id → remote index and collection.
//!
//! Lookups never fail. An id that is not in the catalog resolves to the
//! configured default type, so a client typo degrades routing instead of
//! erroring.

use std::collections::HashMap;

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::types::{AuthorityType, TypeSummary};

/// Immutable registry of the authority vocabularies the service serves.
#[derive(Debug, Clone)]
pub struct AuthorityCatalog {
    entries: Vec<AuthorityType>,
    by_id: HashMap<String, usize>,
    default_index: usize,
}

impl AuthorityCatalog {
    /// Build a catalog from an ordered entry list and a default type id.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if the list is empty, contains a
    /// duplicate id, or does not contain `default_id`.
    pub fn new(entries: Vec<AuthorityType>, default_id: &str) -> Result<Self, ReconcileError> {
        if entries.is_empty() {
            return Err(ReconcileError::Config(
                "at least one authority type must be configured".into(),
            ));
        }

        let mut by_id = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.id.clone(), i).is_some() {
                return Err(ReconcileError::Config(format!(
                    "duplicate authority type id: {}",
                    entry.id
                )));
            }
        }

        let default_index = *by_id.get(default_id).ok_or_else(|| {
            ReconcileError::Config(format!(
                "default authority type {default_id} is not in the catalog"
            ))
        })?;

        Ok(Self {
            entries,
            by_id,
            default_index,
        })
    }

    /// Build the catalog described by `config.authorities` and `config.default_type`.
    pub fn from_config(config: &ReconcileConfig) -> Result<Self, ReconcileError> {
        Self::new(config.authorities.clone(), &config.default_type)
    }

    /// Resolve a type id, falling back to the default type for unknown ids.
    pub fn resolve(&self, id: &str) -> &AuthorityType {
        match self.by_id.get(id) {
            Some(&i) => &self.entries[i],
            None => {
                tracing::debug!(requested = id, "unknown authority type, using default");
                self.default_type()
            }
        }
    }

    fn default_type(&self) -> &AuthorityType {
        &self.entries[self.default_index]
    }

    /// `{id, name}` pairs in configured order, for service metadata.
    pub fn list_types(&self) -> Vec<TypeSummary> {
        self.entries.iter().map(AuthorityType::summary).collect()
    }
}

impl Default for AuthorityCatalog {
    fn default() -> Self {
        let config = ReconcileConfig::default();
        let default_index = config
            .authorities
            .iter()
            .position(|a| a.id == config.default_type)
            .unwrap_or(0);
        let by_id = config
            .authorities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self {
            entries: config.authorities,
            by_id,
            default_index,
        }
    }
}

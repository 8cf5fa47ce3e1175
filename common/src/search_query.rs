//! Query parameters sent to the portal search service.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::facet::FacetField;


/// Terms the user selected in each facet.
pub type FacetFilters = BTreeMap<FacetField, BTreeSet<String>>;

/// Ordered `key=value` pairs; repeated keys are allowed and meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParams(pub Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percent-encodes keys and values the way browsers' `encodeURIComponent` does.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Push one `prefix<field>=<term>` pair for every selected term.
pub fn push_facet_filters(params: &mut QueryParams, filters: &FacetFilters, prefix: &str) {
    for (field, terms) in filters.iter() {
        for term in terms {
            params.push(format!("{prefix}{}", field.as_str()), term.clone());
        }
    }
}

/// One batch of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartFacetQuery {
    pub identifiers: Vec<String>,
    pub facet_filters: FacetFilters,
}

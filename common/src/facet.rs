//! Facet fields and aggregated facet results.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};


/// File attributes the cart view can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetField {
    FileFormat,
    OutputCategory,
    OutputType,
    Assembly,
}

impl FacetField {
    pub const ALL: [FacetField; 4] = [
        FacetField::FileFormat,
        FacetField::OutputCategory,
        FacetField::OutputType,
        FacetField::Assembly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetField::FileFormat => "file_format",
            FacetField::OutputCategory => "output_category",
            FacetField::OutputType => "output_type",
            FacetField::Assembly => "assembly",
        }
    }
}

impl Display for FacetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFacetField(pub String);

impl Display for UnknownFacetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown facet field: {}", self.0)
    }
}

impl FromStr for FacetField {
    type Err = UnknownFacetField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FacetField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownFacetField(s.to_string()))
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTerm {
    pub key: String,
    pub doc_count: u64,
}

impl FacetTerm {
    pub fn new(key: impl Into<String>, doc_count: u64) -> Self {
        Self { key: key.into(), doc_count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: FacetField,
    pub total: u64,
    pub terms: Vec<FacetTerm>,
}

impl FacetResult {
    pub fn term_count(&self, key: &str) -> Option<u64> {
        self.terms.iter().find(|term| term.key == key).map(|term| term.doc_count)
    }
}

/// Finalized facets for one refresh of the cart view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetSet {
    pub total: u64,
    pub facets: Vec<FacetResult>,
}

impl FacetSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FacetField) -> Option<&FacetResult> {
        self.facets.iter().find(|facet| facet.field == field)
    }
}

/// One entry of the file format facet computed from already resolved files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFormatCount {
    pub format: String,
    pub count: u64,
}

use serde::{Deserialize, Deserializer, Serialize};

use crate::facet::FacetTerm;


/// Search response envelope as the portal returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SearchResults<T> {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@graph", default = "Vec::new")]
    pub graph: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub facets: Vec<RawFacet>,
}

/// Facet as reported by one search call. `field` may name fields the
/// cart view does not facet on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFacet {
    pub field: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub terms: Vec<FacetTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetObject {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// Embedded file reference: either a bare `@id` string or an object carrying one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    #[serde(rename = "@id")]
    pub id: String,
}

impl<'de> Deserialize<'de> for FileRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Path(String),
            Object {
                #[serde(rename = "@id")]
                id: String,
            },
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Path(id) => FileRef { id },
            Raw::Object { id } => FileRef { id },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub file_format: String,
    #[serde(default)]
    pub output_type: Option<String>,
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default)]
    pub restricted: bool,
}

//! Facet configuration and facet selection types.
//!
//! Facet configurations live inside the faceted `$search` stage under
//! `facet.facets`. Selections are the bucket choices a user made for those
//! facets in the current request.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::pipeline::Document;

/// Facet `type` of a numeric bucketing facet.
pub const NUMBER_FACET_TYPE: &str = "number";

/// Facet `type` of a string bucketing facet.
pub const STRING_FACET_TYPE: &str = "string";

/// Mapping from facet name to its configuration, in declaration order.
pub type FacetConfigMap = IndexMap<String, FacetConfig>;

/// Buckets documents by a numeric field using explicit boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFacet {
    /// Field path to bucket by.
    pub path: String,
    /// Bucket boundaries, strictly increasing. Bucket `i` is `[boundaries[i], boundaries[i + 1])`.
    pub boundaries: Vec<Number>,
    /// Additional facet options (e.g. `default`), kept verbatim.
    #[serde(flatten)]
    pub extra: Document,
}

/// Buckets documents by the distinct values of a string field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFacet {
    /// Field path to bucket by.
    pub path: String,
    /// Maximum number of buckets to return.
    pub num_buckets: u64,
    /// Additional facet options, kept verbatim.
    #[serde(flatten)]
    pub extra: Document,
}

/// Configuration of a single facet.
///
/// Facet types other than `number` and `string` are carried verbatim in
/// [`FacetConfig::Unrecognized`] so that pipelines using them can still be
/// rewritten. Only building a filter clause for such a facet is an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetConfig {
    Number(NumberFacet),
    String(StringFacet),
    Unrecognized(Document),
}

impl FacetConfig {
    /// Returns the facet `type` as written in the pipeline.
    pub fn type_name(&self) -> &str {
        match self {
            FacetConfig::Number(_) => NUMBER_FACET_TYPE,
            FacetConfig::String(_) => STRING_FACET_TYPE,
            FacetConfig::Unrecognized(body) => {
                body.get("type").and_then(Value::as_str).unwrap_or("")
            }
        }
    }

    /// Parse a facet configuration document.
    ///
    /// # Returns
    ///
    /// * `Ok(FacetConfig)` - The parsed configuration; unknown types become `Unrecognized`
    /// * `Err(String)` - If a `number` or `string` facet is missing required fields
    pub fn from_document(mut body: Document) -> Result<Self, String> {
        let type_name = body.get("type").and_then(Value::as_str).map(str::to_owned);

        match type_name.as_deref() {
            Some(NUMBER_FACET_TYPE) => {
                body.remove("type");
                serde_json::from_value(Value::Object(body))
                    .map(FacetConfig::Number)
                    .map_err(|e| format!("Invalid number facet: {}", e))
            }
            Some(STRING_FACET_TYPE) => {
                body.remove("type");
                serde_json::from_value(Value::Object(body))
                    .map(FacetConfig::String)
                    .map_err(|e| format!("Invalid string facet: {}", e))
            }
            _ => Ok(FacetConfig::Unrecognized(body)),
        }
    }

    /// Render the configuration back into its pipeline document form.
    pub fn to_document(&self) -> Document {
        match self {
            FacetConfig::Number(facet) => {
                let mut body = Document::new();
                body.insert("type".to_string(), Value::from(NUMBER_FACET_TYPE));
                body.insert("path".to_string(), Value::from(facet.path.clone()));
                body.insert(
                    "boundaries".to_string(),
                    Value::Array(facet.boundaries.iter().cloned().map(Value::Number).collect()),
                );
                body.extend(facet.extra.clone());
                body
            }
            FacetConfig::String(facet) => {
                let mut body = Document::new();
                body.insert("type".to_string(), Value::from(STRING_FACET_TYPE));
                body.insert("path".to_string(), Value::from(facet.path.clone()));
                body.insert("numBuckets".to_string(), Value::from(facet.num_buckets));
                body.extend(facet.extra.clone());
                body
            }
            FacetConfig::Unrecognized(body) => body.clone(),
        }
    }
}

impl Serialize for FacetConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FacetConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = Document::deserialize(deserializer)?;
        FacetConfig::from_document(body).map_err(de::Error::custom)
    }
}

/// The buckets a user selected for one facet.
///
/// String facets select bucket ids; number facets select half-open
/// `[min, max)` boundary pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetSelection {
    Buckets(Vec<String>),
    Ranges(Vec<(Number, Number)>),
}

impl FacetSelection {
    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        match self {
            FacetSelection::Buckets(ids) => ids.is_empty(),
            FacetSelection::Ranges(ranges) => ranges.is_empty(),
        }
    }
}

impl Default for FacetSelection {
    fn default() -> Self {
        FacetSelection::Buckets(Vec::new())
    }
}

/// Selected facet buckets keyed by facet name, in selection order.
///
/// Encoded on the wire as a list of `[facetName, selection]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(String, FacetSelection)>",
    into = "Vec<(String, FacetSelection)>"
)]
pub struct SelectedFacets(IndexMap<String, FacetSelection>);

impl SelectedFacets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selection, replacing any previous selection for the same facet.
    pub fn with(mut self, facet_name: impl Into<String>, selection: FacetSelection) -> Self {
        self.0.insert(facet_name.into(), selection);
        self
    }

    pub fn get(&self, facet_name: &str) -> Option<&FacetSelection> {
        self.0.get(facet_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FacetSelection)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<(String, FacetSelection)>> for SelectedFacets {
    fn from(pairs: Vec<(String, FacetSelection)>) -> Self {
        Self(pairs.into_iter().collect())
    }
}

impl From<SelectedFacets> for Vec<(String, FacetSelection)> {
    fn from(selected: SelectedFacets) -> Self {
        selected.0.into_iter().collect()
    }
}

//! Search response types.
//!
//! This module defines the response structure returned to the Runtime pane
//! after a pipeline has been assembled and executed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::facet::{FacetConfig, FacetSelection};
use super::pipeline::{Document, Pipeline};

/// Document count of a single facet bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetBucket {
    /// Bucket id: the string value for string facets, the lower boundary for number facets.
    #[serde(rename = "_id")]
    pub id: Value,
    pub count: u64,
}

/// Facet bucket counts alongside the facet configuration and the current selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacetMeta {
    pub name: String,
    pub config: FacetConfig,
    pub result: Vec<FacetBucket>,
    pub selected_bucket_ids: FacetSelection,
}

/// Metadata produced by the companion `$searchMeta` pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchMeta {
    pub facets: Vec<FacetMeta>,
}

/// Complete search response with result documents, facet metadata and the
/// pipeline that produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    /// Result documents, in the order the pipeline returned them.
    pub docs: Vec<Document>,

    pub meta: SearchMeta,

    /// The executed pipeline, included verbatim for diagnostic display.
    pub pipeline: Pipeline,
}

impl SearchResponse {
    /// Create a response without facet metadata.
    pub fn new(docs: Vec<Document>, pipeline: Pipeline) -> Self {
        Self {
            docs,
            meta: SearchMeta::default(),
            pipeline,
        }
    }

    /// Attach facet metadata.
    pub fn with_meta(mut self, meta: SearchMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Returns true if there are no result documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Returns the number of result documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

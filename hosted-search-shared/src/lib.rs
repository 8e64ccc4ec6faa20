//! # Hosted Search Shared
//!
//! This crate defines the data structures shared across the hosted search
//! ecosystem: aggregation pipelines, design definitions, facet and filter
//! configuration, per-request user selections and the search response shape.

pub mod types;

pub use types::design_definition::{
    DesignDefinition, SearchIndexRef, UiDefinition, UrlTemplate, URL_FIELD_NAME_VARIABLE,
};
pub use types::facet::{
    FacetConfig, FacetConfigMap, FacetSelection, NumberFacet, SelectedFacets, StringFacet,
};
pub use types::filter::{FilterType, RangeFilterSpec, RangeSelection, SelectedFilters};
pub use types::pipeline::{
    Document, Pipeline, Stage, LIMIT_STAGE_NAME, SEARCH_META_STAGE_NAME, SEARCH_QUERY_VARIABLE,
    SEARCH_STAGE_NAME, SORT_STAGE_NAME,
};
pub use types::search_query::{SortDirection, SortRequest};
pub use types::search_result::{FacetBucket, FacetMeta, SearchMeta, SearchResponse};

//! Search request type and query parameter decoding.

use std::collections::HashMap;

use hosted_search_shared::{DesignDefinition, SelectedFacets, SelectedFilters, SortRequest};
use serde::de::DeserializeOwned;

use crate::errors::PipelineError;

pub const SEARCH_QUERY_PARAM: &str = "searchQuery";
pub const DESIGN_DEFINITION_PARAM: &str = "designDefinition";
pub const SELECTED_FACETS_PARAM: &str = "selectedFacets";
pub const SELECTED_FILTERS_PARAM: &str = "selectedFilters";
pub const SORT_PARAM: &str = "sort";

/// A decoded search request: the design being tried plus the user's
/// per-request query text and selections.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub design: DesignDefinition,

    /// Trimmed search text. Empty text means browse mode.
    pub query: String,

    pub selected_facets: SelectedFacets,

    pub selected_filters: SelectedFilters,

    /// `None` keeps the engine's relevance ordering.
    pub sort: Option<SortRequest>,
}

impl SearchRequest {
    /// Create a request without selections or sort.
    pub fn new(design: DesignDefinition, query: impl Into<String>) -> Self {
        Self {
            design,
            query: query.into().trim().to_string(),
            selected_facets: SelectedFacets::default(),
            selected_filters: SelectedFilters::default(),
            sort: None,
        }
    }

    /// Set the selected facet buckets.
    pub fn with_facets(mut self, selected_facets: SelectedFacets) -> Self {
        self.selected_facets = selected_facets;
        self
    }

    /// Set the selected range filters.
    pub fn with_filters(mut self, selected_filters: SelectedFilters) -> Self {
        self.selected_filters = selected_filters;
        self
    }

    /// Set the sort request.
    pub fn with_sort(mut self, sort: SortRequest) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Returns true if the search text is empty.
    pub fn is_browse(&self) -> bool {
        self.query.is_empty()
    }

    /// Decode a request from its query parameters.
    ///
    /// `designDefinition`, `selectedFacets`, `selectedFilters` and `sort` are
    /// JSON-encoded. Missing or empty optional parameters mean no selection
    /// and no sort.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchRequest)` - The decoded request
    /// * `Err(PipelineError::ValidationError)` - If the design definition is missing or
    ///   cannot be decoded, or the sort cannot be decoded
    /// * `Err(PipelineError::InvalidFacetSelection)` - If the facet selection cannot be decoded
    /// * `Err(PipelineError::InvalidFilterSelection)` - If the filter selection cannot be decoded
    pub fn from_query_params(params: &HashMap<String, String>) -> Result<Self, PipelineError> {
        let design: DesignDefinition =
            decode_param(params, DESIGN_DEFINITION_PARAM, PipelineError::validation)?.ok_or_else(
                || PipelineError::validation(format!("{} is required", DESIGN_DEFINITION_PARAM)),
            )?;
        let query = params
            .get(SEARCH_QUERY_PARAM)
            .cloned()
            .unwrap_or_default();

        let mut request = Self::new(design, query);
        if let Some(selected_facets) = decode_param(
            params,
            SELECTED_FACETS_PARAM,
            PipelineError::invalid_facet_selection,
        )? {
            request.selected_facets = selected_facets;
        }
        if let Some(selected_filters) = decode_param(
            params,
            SELECTED_FILTERS_PARAM,
            PipelineError::invalid_filter_selection,
        )? {
            request.selected_filters = selected_filters;
        }
        request.sort = decode_param(params, SORT_PARAM, PipelineError::validation)?;

        Ok(request)
    }
}

/// Decode a JSON-encoded parameter, mapping decode failures with `error`.
fn decode_param<T: DeserializeOwned>(
    params: &HashMap<String, String>,
    name: &str,
    error: fn(String) -> PipelineError,
) -> Result<Option<T>, PipelineError> {
    match params.get(name).map(|raw| raw.trim()) {
        None | Some("") | Some("null") => Ok(None),
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| error(format!("Invalid {}: {}", name, e))),
    }
}

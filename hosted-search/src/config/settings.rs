//! Environment settings for the hosted search runner.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use hosted_search_pipeline::config::DEFAULT_BROWSE_PATH;
use hosted_search_pipeline::request::{
    DESIGN_DEFINITION_PARAM, SEARCH_QUERY_PARAM, SELECTED_FACETS_PARAM, SELECTED_FILTERS_PARAM,
    SORT_PARAM,
};
use hosted_search_pipeline::{AssemblerConfig, BrowseOperator, SearchRequest, SubstitutionMode};
use tracing::warn;

use crate::AppError;

/// Default path of the `exists` browse operator.
const DEFAULT_EXISTS_PATH: &str = "_id";

/// Settings for one search run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// JSON file holding the design definition.
    pub design_definition_path: PathBuf,

    pub search_query: String,

    /// JSON-encoded facet selections, as sent by the search UI.
    pub selected_facets: Option<String>,

    /// JSON-encoded range filter selections.
    pub selected_filters: Option<String>,

    /// JSON-encoded sort request.
    pub sort: Option<String>,

    pub assembler: AssemblerConfig,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DESIGN_DEFINITION_PATH`: Design definition JSON file (required)
    /// - `SEARCH_QUERY`: Search text (default: empty, which browses)
    /// - `SELECTED_FACETS`: JSON list of `[facetName, selection]` pairs
    /// - `SELECTED_FILTERS`: JSON list of `[filterKey, { min, max }]` pairs
    /// - `SORT`: JSON `{ path, direction }`
    /// - `PAGE_SIZE`: Size of the appended `$limit` stage (default: 10)
    /// - `BROWSE_OPERATOR`: "query-string" or "exists" (default: query-string)
    /// - `BROWSE_PATH`: Path of the browse operator
    /// - `SUBSTITUTION_MODE`: "structural" or "textual" (default: structural)
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Loaded settings
    /// * `Err(AppError::Config)` - If `DESIGN_DEFINITION_PATH` is not set
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    ///
    /// Invalid optional values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let design_definition_path = non_empty("DESIGN_DEFINITION_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::config("DESIGN_DEFINITION_PATH is required"))?;

        let mut assembler = AssemblerConfig::default();

        if let Some(raw) = non_empty("PAGE_SIZE") {
            match raw.trim().parse::<u64>() {
                Ok(page_size) if page_size > 0 => assembler = assembler.with_page_size(page_size),
                _ => warn!(
                    value = %raw,
                    default = assembler.page_size,
                    "Invalid PAGE_SIZE, using default"
                ),
            }
        }

        let browse_path = non_empty("BROWSE_PATH");
        let browse_operator = match non_empty("BROWSE_OPERATOR")
            .map(|value| value.trim().to_lowercase())
            .as_deref()
        {
            None | Some("query-string") | Some("querystring") | Some("query_string") => {
                BrowseOperator::QueryStringMatchAll {
                    default_path: browse_path.unwrap_or_else(|| DEFAULT_BROWSE_PATH.to_string()),
                }
            }
            Some("exists") => BrowseOperator::Exists {
                path: browse_path.unwrap_or_else(|| DEFAULT_EXISTS_PATH.to_string()),
            },
            Some(other) => {
                warn!(value = other, "Invalid BROWSE_OPERATOR, defaulting to 'query-string'");
                BrowseOperator::QueryStringMatchAll {
                    default_path: browse_path.unwrap_or_else(|| DEFAULT_BROWSE_PATH.to_string()),
                }
            }
        };
        assembler = assembler.with_browse_operator(browse_operator);

        let substitution = match non_empty("SUBSTITUTION_MODE")
            .map(|value| value.trim().to_lowercase())
            .as_deref()
        {
            None | Some("structural") => SubstitutionMode::Structural,
            Some("textual") => SubstitutionMode::Textual,
            Some(other) => {
                warn!(value = other, "Invalid SUBSTITUTION_MODE, defaulting to 'structural'");
                SubstitutionMode::Structural
            }
        };
        assembler = assembler.with_substitution(substitution);

        Ok(Self {
            design_definition_path,
            search_query: lookup("SEARCH_QUERY").unwrap_or_default(),
            selected_facets: non_empty("SELECTED_FACETS"),
            selected_filters: non_empty("SELECTED_FILTERS"),
            sort: non_empty("SORT"),
            assembler,
        })
    }

    /// Read the design definition file and decode the search request.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchRequest)` - The decoded request
    /// * `Err(AppError::Io)` - If the design definition file cannot be read
    /// * `Err(AppError::Pipeline)` - If the design or a selection cannot be decoded
    pub fn load_request(&self) -> Result<SearchRequest, AppError> {
        let design_json = std::fs::read_to_string(&self.design_definition_path)?;
        self.request_from_design(design_json)
    }

    /// Decode the search request for an already loaded design definition.
    pub fn request_from_design(&self, design_json: String) -> Result<SearchRequest, AppError> {
        let mut params = HashMap::new();
        params.insert(DESIGN_DEFINITION_PARAM.to_string(), design_json);
        params.insert(SEARCH_QUERY_PARAM.to_string(), self.search_query.clone());

        let optional = [
            (SELECTED_FACETS_PARAM, &self.selected_facets),
            (SELECTED_FILTERS_PARAM, &self.selected_filters),
            (SORT_PARAM, &self.sort),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.to_string(), value.clone());
            }
        }

        Ok(SearchRequest::from_query_params(&params)?)
    }
}

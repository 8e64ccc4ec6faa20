//! Configuration types for the PipelineAssembler.

use serde_json::{json, Map, Value};

/// Page size of the `$limit` stage appended when a pipeline has none.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Default path of the match-everything `queryString` operator.
///
/// `*:*` matches every document regardless of the default path, so the path
/// only needs to be syntactically valid.
pub const DEFAULT_BROWSE_PATH: &str = "does-not-exists";

/// Operator used in place of the user's query operator when the search text is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseOperator {
    /// `{ queryString: { query: "*:*", defaultPath } }`
    QueryStringMatchAll { default_path: String },
    /// `{ exists: { path } }`; matches every document that has `path`.
    Exists { path: String },
}

impl Default for BrowseOperator {
    fn default() -> Self {
        BrowseOperator::QueryStringMatchAll {
            default_path: DEFAULT_BROWSE_PATH.to_string(),
        }
    }
}

impl BrowseOperator {
    /// Render the operator as its single-key document.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = Map::new();
        match self {
            BrowseOperator::QueryStringMatchAll { default_path } => {
                document.insert(
                    "queryString".to_string(),
                    json!({ "query": "*:*", "defaultPath": default_path }),
                );
            }
            BrowseOperator::Exists { path } => {
                document.insert("exists".to_string(), json!({ "path": path }));
            }
        }
        document
    }
}

/// How the search text replaces the query placeholder in a pipeline template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Replace the placeholder inside string values only. Keys, numbers and
    /// booleans are never touched.
    #[default]
    Structural,
    /// Serialize the pipeline, replace the placeholder in the text, and parse
    /// it back. The search text is JSON-escaped, so the result is always valid
    /// JSON; placeholders inside keys are replaced too.
    Textual,
}

/// Configuration for the PipelineAssembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Size of the `$limit` stage appended to pipelines without one.
    pub page_size: u64,

    /// Operator used for empty search text ("browse" mode).
    pub browse_operator: BrowseOperator,

    /// Placeholder substitution strategy.
    pub substitution: SubstitutionMode,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            browse_operator: BrowseOperator::default(),
            substitution: SubstitutionMode::default(),
        }
    }
}

impl AssemblerConfig {
    /// Create a config with a custom page size.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Size of the appended `$limit` stage
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Create a config with a custom browse-mode operator.
    pub fn with_browse_operator(mut self, browse_operator: BrowseOperator) -> Self {
        self.browse_operator = browse_operator;
        self
    }

    /// Create a config with a custom substitution strategy.
    pub fn with_substitution(mut self, substitution: SubstitutionMode) -> Self {
        self.substitution = substitution;
        self
    }
}

//! Typed view of the `$search` stage.
//!
//! The search stage body is untyped JSON on the wire. The core parses it into
//! sum types per structural position (plain vs faceted stage, compound vs
//! named operator) and renders it back only when a rewritten stage is stored
//! in a pipeline.

use hosted_search_shared::{Document, FacetConfigMap};
use serde_json::Value;

use crate::errors::PipelineError;

/// Name of the boolean operator combining sub-operators.
pub const COMPOUND_OPERATOR_NAME: &str = "compound";

/// Stage-level key holding the facet collector.
pub const FACET_COLLECTOR_NAME: &str = "facet";

/// Stage-level keys that configure the search but are not query operators.
pub const ANCILLARY_KEYS: &[&str] = &[
    "index",
    "highlight",
    "count",
    "returnStoredSource",
    "scoreDetails",
    "sort",
    "tracking",
    "concurrent",
    "searchAfter",
    "searchBefore",
];

/// Clause of a compound operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundClause {
    Must,
    MustNot,
    Should,
    Filter,
}

impl CompoundClause {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundClause::Must => "must",
            CompoundClause::MustNot => "mustNot",
            CompoundClause::Should => "should",
            CompoundClause::Filter => "filter",
        }
    }
}

/// Body of a `compound` operator.
///
/// Clause arrays and options (`minimumShouldMatch`, `score`) are kept in
/// their original key order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundOperator {
    clauses: Document,
}

impl CompoundOperator {
    /// Create a compound operator whose `must` clause holds `operator`.
    pub fn with_must(operator: Operator) -> Self {
        let mut clauses = Document::new();
        clauses.insert(
            CompoundClause::Must.as_str().to_string(),
            Value::Array(vec![Value::Object(operator.into_document())]),
        );
        Self { clauses }
    }

    fn from_body(body: Value) -> Result<Self, PipelineError> {
        match body {
            Value::Object(clauses) => Ok(Self { clauses }),
            other => Err(PipelineError::malformed_pipeline(format!(
                "compound operator must be a document, found {}",
                other
            ))),
        }
    }

    /// Returns the documents of `clause`. A single document is treated as a one-element clause.
    pub fn clause(&self, clause: CompoundClause) -> Vec<&Value> {
        match self.clauses.get(clause.as_str()) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single],
        }
    }

    /// Prepend `clauses` to the `filter` clause, keeping existing filters after them.
    ///
    /// Creates the `filter` clause when it is absent.
    pub fn prepend_filter_clauses(&mut self, clauses: Vec<Value>) {
        let key = CompoundClause::Filter.as_str();
        match self.clauses.get_mut(key) {
            Some(Value::Array(existing)) => {
                let previous = std::mem::replace(existing, clauses);
                existing.extend(previous);
            }
            Some(slot) if !slot.is_null() => {
                let single = slot.take();
                let mut merged = clauses;
                merged.push(single);
                *slot = Value::Array(merged);
            }
            _ => {
                self.clauses.insert(key.to_string(), Value::Array(clauses));
            }
        }
    }

    pub fn into_body(self) -> Value {
        Value::Object(self.clauses)
    }
}

/// The single query operator at the operator position.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Compound(CompoundOperator),
    /// Any other operator (`text`, `queryString`, `range`, ...), kept verbatim.
    Named { name: String, body: Value },
}

impl Operator {
    /// Parse the operator position document, which must hold exactly one key.
    ///
    /// `location` names the position in error messages.
    pub fn from_document(document: Document, location: &str) -> Result<Self, PipelineError> {
        if document.len() != 1 {
            return Err(PipelineError::no_operator_found(format!(
                "expected exactly one operator in {}, found {}",
                location,
                document.len()
            )));
        }

        let (name, body) = document.into_iter().next().ok_or_else(|| {
            PipelineError::no_operator_found(format!("no operator in {}", location))
        })?;

        if name == COMPOUND_OPERATOR_NAME {
            CompoundOperator::from_body(body).map(Operator::Compound)
        } else {
            Ok(Operator::Named { name, body })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Operator::Compound(_) => COMPOUND_OPERATOR_NAME,
            Operator::Named { name, .. } => name,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Operator::Compound(_))
    }

    /// Render the operator as its single-key document.
    pub fn into_document(self) -> Document {
        let mut document = Document::new();
        match self {
            Operator::Compound(compound) => {
                document.insert(COMPOUND_OPERATOR_NAME.to_string(), compound.into_body());
            }
            Operator::Named { name, body } => {
                document.insert(name, body);
            }
        }
        document
    }
}

/// The `facet` collector of a faceted search stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetCollector {
    pub operator: Operator,
    pub facets: FacetConfigMap,
    /// Other collector keys, kept verbatim.
    pub extra: Document,
}

impl FacetCollector {
    fn from_body(body: Value) -> Result<Self, PipelineError> {
        let Value::Object(body) = body else {
            return Err(PipelineError::malformed_pipeline(
                "facet collector must be a document",
            ));
        };

        let mut operator = None;
        let mut facets = None;
        let mut extra = Document::new();
        for (key, value) in body {
            match key.as_str() {
                "operator" => operator = Some(value),
                "facets" => facets = Some(value),
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        let operator = match operator {
            Some(Value::Object(document)) => Operator::from_document(document, "facet.operator")?,
            Some(_) | None => {
                return Err(PipelineError::no_operator_found(
                    "facet.operator is missing or not a document",
                ))
            }
        };

        let facets = facets
            .ok_or_else(|| PipelineError::malformed_pipeline("facet.facets is missing"))
            .and_then(|facets| {
                serde_json::from_value::<FacetConfigMap>(facets).map_err(|e| {
                    PipelineError::malformed_pipeline(format!("invalid facet.facets: {}", e))
                })
            })?;

        Ok(Self {
            operator,
            facets,
            extra,
        })
    }

    fn into_body(self) -> Value {
        let mut body = Document::new();
        body.insert(
            "operator".to_string(),
            Value::Object(self.operator.into_document()),
        );
        body.insert(
            "facets".to_string(),
            Value::Object(
                self.facets
                    .into_iter()
                    .map(|(name, config)| (name, Value::Object(config.to_document())))
                    .collect(),
            ),
        );
        body.extend(self.extra);
        Value::Object(body)
    }
}

/// Shape of the search stage.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchShape {
    /// The operator sits directly in the stage body.
    Plain(Operator),
    /// The operator sits in `facet.operator`, next to the facet configuration.
    Faceted(FacetCollector),
}

/// Typed `$search` stage body.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStage {
    /// Ancillary stage-level keys (`index`, `highlight`, `count`, ...).
    pub options: Document,
    pub shape: SearchShape,
}

impl SearchStage {
    /// Parse a `$search` stage body.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchStage)` - The typed stage
    /// * `Err(PipelineError::MalformedPipeline)` - If the body or facet configuration is malformed
    /// * `Err(PipelineError::NoOperatorFound)` - If the operator position does not hold exactly one operator
    pub fn from_body(body: Value) -> Result<Self, PipelineError> {
        let Value::Object(body) = body else {
            return Err(PipelineError::malformed_pipeline(
                "search stage body must be a document",
            ));
        };

        if body.contains_key(FACET_COLLECTOR_NAME) {
            let mut options = Document::new();
            let mut collector = Value::Null;
            for (key, value) in body {
                if key == FACET_COLLECTOR_NAME {
                    collector = value;
                } else {
                    options.insert(key, value);
                }
            }

            return Ok(Self {
                options,
                shape: SearchShape::Faceted(FacetCollector::from_body(collector)?),
            });
        }

        let mut options = Document::new();
        let mut operator = Document::new();
        for (key, value) in body {
            if ANCILLARY_KEYS.contains(&key.as_str()) {
                options.insert(key, value);
            } else {
                operator.insert(key, value);
            }
        }

        Ok(Self {
            options,
            shape: SearchShape::Plain(Operator::from_document(operator, "$search")?),
        })
    }

    /// Create a stage from its options and shape.
    pub fn new(options: Document, shape: SearchShape) -> Self {
        Self { options, shape }
    }

    pub fn operator(&self) -> &Operator {
        match &self.shape {
            SearchShape::Plain(operator) => operator,
            SearchShape::Faceted(collector) => &collector.operator,
        }
    }

    pub fn operator_mut(&mut self) -> &mut Operator {
        match &mut self.shape {
            SearchShape::Plain(operator) => operator,
            SearchShape::Faceted(collector) => &mut collector.operator,
        }
    }

    /// Replace the operator at the operator position, keeping everything else.
    pub fn map_operator(mut self, f: impl FnOnce(Operator) -> Operator) -> Self {
        self.shape = match self.shape {
            SearchShape::Plain(operator) => SearchShape::Plain(f(operator)),
            SearchShape::Faceted(mut collector) => {
                collector.operator = f(collector.operator);
                SearchShape::Faceted(collector)
            }
        };
        self
    }

    pub fn is_faceted(&self) -> bool {
        matches!(self.shape, SearchShape::Faceted(_))
    }

    /// Returns the facet configuration of a faceted stage.
    pub fn facets(&self) -> Option<&FacetConfigMap> {
        match &self.shape {
            SearchShape::Plain(_) => None,
            SearchShape::Faceted(collector) => Some(&collector.facets),
        }
    }

    /// Render the stage back into its body document.
    pub fn into_body(self) -> Value {
        let mut body = self.options;
        match self.shape {
            SearchShape::Plain(operator) => body.extend(operator.into_document()),
            SearchShape::Faceted(collector) => {
                body.insert(FACET_COLLECTOR_NAME.to_string(), collector.into_body());
            }
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_stage_splits_options_and_operator() {
        let stage = SearchStage::from_body(json!({
            "index": "default",
            "text": { "query": "loft", "path": "name" },
            "highlight": { "path": "name" }
        }))
        .unwrap();

        assert!(!stage.is_faceted());
        assert_eq!(stage.operator().name(), "text");
        assert_eq!(stage.options.len(), 2);
        assert!(stage.facets().is_none());
    }

    #[test]
    fn test_plain_stage_with_two_operators() {
        let result = SearchStage::from_body(json!({
            "text": { "query": "loft", "path": "name" },
            "exists": { "path": "name" }
        }));
        assert!(matches!(result, Err(PipelineError::NoOperatorFound(_))));
    }

    #[test]
    fn test_plain_stage_with_only_options() {
        let result = SearchStage::from_body(json!({ "index": "default", "count": { "type": "total" } }));
        assert!(matches!(result, Err(PipelineError::NoOperatorFound(_))));
    }

    #[test]
    fn test_non_document_body_is_malformed() {
        let result = SearchStage::from_body(json!([1, 2]));
        assert!(matches!(result, Err(PipelineError::MalformedPipeline(_))));
    }

    #[test]
    fn test_faceted_stage() {
        let stage = SearchStage::from_body(json!({
            "index": "facets",
            "facet": {
                "operator": { "text": { "query": "beach", "path": "name" } },
                "facets": {
                    "bedTypesFacet": { "type": "string", "path": "bed_type", "numBuckets": 3 }
                }
            }
        }))
        .unwrap();

        assert!(stage.is_faceted());
        assert_eq!(stage.operator().name(), "text");
        assert_eq!(stage.facets().unwrap().len(), 1);
    }

    #[test]
    fn test_faceted_stage_without_operator() {
        let result = SearchStage::from_body(json!({
            "facet": { "facets": {} }
        }));
        assert!(matches!(result, Err(PipelineError::NoOperatorFound(_))));

        let result = SearchStage::from_body(json!({
            "facet": { "operator": {}, "facets": {} }
        }));
        assert!(matches!(result, Err(PipelineError::NoOperatorFound(_))));
    }

    #[test]
    fn test_faceted_stage_without_facets_is_malformed() {
        let result = SearchStage::from_body(json!({
            "facet": { "operator": { "text": { "query": "beach", "path": "name" } } }
        }));
        assert!(matches!(result, Err(PipelineError::MalformedPipeline(_))));
    }

    #[test]
    fn test_render_round_trip_keeps_documents() {
        let body = json!({
            "index": "facets",
            "facet": {
                "operator": { "compound": { "must": [{ "text": { "query": "beach", "path": "name" } }] } },
                "facets": {
                    "accommodatesFacet": { "type": "number", "path": "accommodates", "boundaries": [1, 3, 5], "default": "more" }
                }
            }
        });

        let stage = SearchStage::from_body(body.clone()).unwrap();
        assert!(stage.operator().is_compound());
        assert_eq!(stage.into_body(), body);
    }

    #[test]
    fn test_prepend_filter_clauses() {
        let mut compound = CompoundOperator::from_body(json!({
            "must": [{ "text": { "query": "beach", "path": "name" } }],
            "filter": [{ "f": 1 }, { "f": 2 }]
        }))
        .unwrap();

        compound.prepend_filter_clauses(vec![json!({ "g": 1 }), json!({ "g": 2 })]);

        let filters: Vec<Value> = compound
            .clause(CompoundClause::Filter)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(
            filters,
            vec![json!({ "g": 1 }), json!({ "g": 2 }), json!({ "f": 1 }), json!({ "f": 2 })]
        );
    }

    #[test]
    fn test_prepend_filter_clauses_creates_filter() {
        let mut compound = CompoundOperator::with_must(Operator::Named {
            name: "text".to_string(),
            body: json!({ "query": "beach", "path": "name" }),
        });
        compound.prepend_filter_clauses(vec![json!({ "g": 1 })]);

        assert_eq!(
            compound.into_body(),
            json!({
                "must": [{ "text": { "query": "beach", "path": "name" } }],
                "filter": [{ "g": 1 }]
            })
        );
    }

    #[test]
    fn test_prepend_filter_clauses_to_single_document_filter() {
        let mut compound = CompoundOperator::from_body(json!({
            "filter": { "f": 1 }
        }))
        .unwrap();
        compound.prepend_filter_clauses(vec![json!({ "g": 1 })]);

        assert_eq!(compound.into_body(), json!({ "filter": [{ "g": 1 }, { "f": 1 }] }));
    }
}

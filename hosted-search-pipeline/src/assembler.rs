//! Pipeline assembly.
//!
//! Turns a design's pipeline template plus the user's per-request query text
//! and selections into the pipeline that is handed to the executor.
//!
//! Assembly is deterministic: the same request always produces the same
//! pipeline, byte for byte.

use hosted_search_shared::{
    Document, Pipeline, Stage, LIMIT_STAGE_NAME, SEARCH_META_STAGE_NAME, SEARCH_QUERY_VARIABLE,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::clauses::{build_facet_filter_clauses, build_range_filter_clauses, build_sort_stage};
use crate::compound::{append_filter_clause, wrap_in_compound};
use crate::config::{AssemblerConfig, SubstitutionMode};
use crate::errors::PipelineError;
use crate::introspect::{self, replace_search_stage};
use crate::request::SearchRequest;
use crate::types::{FacetCollector, Operator, SearchShape, SearchStage};

/// Search stage keys the `$searchMeta` stage does not accept.
pub const META_UNSUPPORTED_KEYS: &[&str] = &[
    "highlight",
    "returnStoredSource",
    "sort",
    "scoreDetails",
    "searchAfter",
    "searchBefore",
];

/// Builds runnable pipelines from search requests.
#[derive(Debug, Clone, Default)]
pub struct PipelineAssembler {
    config: AssemblerConfig,
}

impl PipelineAssembler {
    /// Create an assembler with the given configuration.
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Assemble the primary search pipeline.
    ///
    /// 1. Substitute the query placeholder with the search text, or build the
    ///    browse-mode pipeline when the text is empty.
    /// 2. Add facet filter clauses, then range filter clauses, wrapping the
    ///    operator in a compound operator first.
    /// 3. Insert the `$sort` stage.
    /// 4. Ensure exactly one `$limit` stage.
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - The runnable pipeline
    /// * `Err(PipelineError)` - If the template is malformed or a selection is invalid
    #[instrument(skip(self, request), fields(browse = request.is_browse()))]
    pub fn assemble(&self, request: &SearchRequest) -> Result<Pipeline, PipelineError> {
        let pipeline = self.base_pipeline(request)?;
        let mut pipeline = apply_filters(pipeline, request)?;

        if let Some(sort) = &request.sort {
            debug!(path = %sort.path, direction = ?sort.direction, "Adding sort stage");
            pipeline = insert_sort_stage(wrap_in_compound(pipeline)?, build_sort_stage(sort));
        }

        Ok(ensure_limit(pipeline, self.config.page_size))
    }

    /// Assemble the companion `$searchMeta` pipeline that produces facet bucket
    /// counts under the same query and filters as [`assemble`](Self::assemble).
    ///
    /// The pipeline holds only the `$searchMeta` stage.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Pipeline))` - The meta pipeline for a faceted design
    /// * `Ok(None)` - If the design's search stage has no facets
    /// * `Err(PipelineError)` - If the template is malformed or a selection is invalid
    #[instrument(skip(self, request), fields(browse = request.is_browse()))]
    pub fn assemble_meta(&self, request: &SearchRequest) -> Result<Option<Pipeline>, PipelineError> {
        if !introspect::has_facet_operator(&request.design.pipeline)? {
            return Ok(None);
        }

        let pipeline = apply_filters(self.base_pipeline(request)?, request)?;
        let search_body = introspect::search_stage_body(&pipeline)?;

        let meta_body: Document = search_body
            .iter()
            .filter(|(key, _)| !META_UNSUPPORTED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Some(Pipeline::new(vec![Stage::new(
            SEARCH_META_STAGE_NAME,
            Value::Object(meta_body),
        )])))
    }

    /// Step 1: substituted template or browse-mode pipeline.
    fn base_pipeline(&self, request: &SearchRequest) -> Result<Pipeline, PipelineError> {
        if request.is_browse() {
            debug!("Empty search text, building browse pipeline");
            browse_pipeline(request, &self.config)
        } else {
            substitute_query(
                request.design.pipeline.clone(),
                &request.query,
                self.config.substitution,
            )
        }
    }
}

/// Replace the query placeholder with `query` everywhere it occurs.
///
/// A template without the placeholder is returned unchanged.
pub fn substitute_query(
    pipeline: Pipeline,
    query: &str,
    mode: SubstitutionMode,
) -> Result<Pipeline, PipelineError> {
    match mode {
        SubstitutionMode::Structural => {
            let mut pipeline = pipeline;
            for stage in pipeline.stages_mut() {
                replace_in_strings(stage.body_mut(), SEARCH_QUERY_VARIABLE, query);
            }
            Ok(pipeline)
        }
        SubstitutionMode::Textual => {
            let serialized = serde_json::to_string(&pipeline)?;
            // Escape the text as a JSON string literal, without the surrounding quotes.
            let escaped = serde_json::to_string(query)?;
            let escaped = &escaped[1..escaped.len() - 1];
            let replaced = serialized.replace(SEARCH_QUERY_VARIABLE, escaped);
            Ok(serde_json::from_str(&replaced)?)
        }
    }
}

fn replace_in_strings(value: &mut Value, token: &str, replacement: &str) {
    match value {
        Value::String(s) if s.contains(token) => *s = s.replace(token, replacement),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| replace_in_strings(item, token, replacement)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| replace_in_strings(item, token, replacement)),
        _ => {}
    }
}

/// Build the browse-mode pipeline for a request with empty search text.
///
/// The pipeline targets the design's index with the configured
/// match-everything operator, keeping the faceted or plain shape and the facet
/// configuration of the design's search stage.
pub fn browse_pipeline(
    request: &SearchRequest,
    config: &AssemblerConfig,
) -> Result<Pipeline, PipelineError> {
    let design_stage = introspect::search_stage(&request.design.pipeline)?;
    let operator = Operator::from_document(config.browse_operator.to_document(), "browse operator")?;

    let shape = match design_stage.shape {
        SearchShape::Plain(_) => SearchShape::Plain(operator),
        SearchShape::Faceted(collector) => SearchShape::Faceted(FacetCollector {
            operator,
            facets: collector.facets,
            extra: collector.extra,
        }),
    };

    let mut options = Document::new();
    options.insert(
        "index".to_string(),
        Value::from(request.design.search_index.name.clone()),
    );

    Ok(replace_search_stage(
        Pipeline::default(),
        SearchStage::new(options, shape),
    ))
}

/// Steps 2 and 3 of assembly: facet clauses, then range filter clauses.
///
/// A non-empty selection map always wraps the operator and gets a `filter`
/// clause, even when every selection in it builds no clause.
fn apply_filters(pipeline: Pipeline, request: &SearchRequest) -> Result<Pipeline, PipelineError> {
    let mut pipeline = pipeline;

    if !request.selected_facets.is_empty() {
        let stage = introspect::search_stage(&pipeline)?;
        let facets = stage.facets().cloned().unwrap_or_default();
        let clauses = build_facet_filter_clauses(&request.selected_facets, &facets)?;
        debug!(clause_count = clauses.len(), "Adding facet filter clauses");
        pipeline = append_filter_clause(wrap_in_compound(pipeline)?, clauses)?;
    }

    if !request.selected_filters.is_empty() {
        let clauses =
            build_range_filter_clauses(&request.selected_filters, &request.design.filters)?;
        debug!(clause_count = clauses.len(), "Adding range filter clauses");
        pipeline = append_filter_clause(wrap_in_compound(pipeline)?, clauses)?;
    }

    Ok(pipeline)
}

/// Insert `sort` before the first `$limit` stage, or append it when there is none.
pub fn insert_sort_stage(pipeline: Pipeline, sort: Stage) -> Pipeline {
    let mut pipeline = pipeline;
    match pipeline.position(LIMIT_STAGE_NAME) {
        Some(index) => pipeline.stages_mut().insert(index, sort),
        None => pipeline.push(sort),
    }
    pipeline
}

/// Ensure exactly one `$limit` stage.
///
/// Keeps the first `$limit` stage and drops any later ones; appends
/// `{ $limit: page_size }` when there is none.
pub fn ensure_limit(pipeline: Pipeline, page_size: u64) -> Pipeline {
    let mut pipeline = pipeline;
    match pipeline.count_stages(LIMIT_STAGE_NAME) {
        0 => {
            debug!(page_size, "Appending limit stage");
            pipeline.push(Stage::limit(page_size));
        }
        1 => {}
        count => {
            debug!(count, "Dropping duplicate limit stages");
            let mut seen = false;
            pipeline.stages_mut().retain(|stage| {
                if !stage.is_named(LIMIT_STAGE_NAME) {
                    return true;
                }
                !std::mem::replace(&mut seen, true)
            });
        }
    }
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowseOperator;
    use hosted_search_shared::{
        DesignDefinition, FacetSelection, RangeFilterSpec, RangeSelection, SearchIndexRef,
        SelectedFacets, SelectedFilters, SortRequest,
    };
    use serde_json::json;

    fn pipeline(value: Value) -> Pipeline {
        serde_json::from_value(value).unwrap()
    }

    fn design(pipeline_value: Value) -> DesignDefinition {
        DesignDefinition::new(
            SearchIndexRef {
                name: "facets".to_string(),
                database_name: "sample_airbnb".to_string(),
                collection_name: "listingsAndReviews".to_string(),
            },
            pipeline(pipeline_value),
        )
    }

    fn text_design() -> DesignDefinition {
        design(json!([
            { "$search": { "index": "facets", "text": { "query": "$$SEARCH_QUERY", "path": "name" } } },
            { "$limit": 10 }
        ]))
        .with_filters(vec![
            RangeFilterSpec::number_range("beds"),
            RangeFilterSpec::number_range("bedrooms"),
        ])
    }

    fn faceted_design() -> DesignDefinition {
        design(json!([
            { "$search": {
                "index": "facets",
                "highlight": { "path": "name" },
                "facet": {
                    "operator": { "text": { "query": "$$SEARCH_QUERY", "path": { "wildcard": "*" } } },
                    "facets": {
                        "accommodatesFacet": { "type": "number", "path": "accommodates", "boundaries": [1, 3, 5] },
                        "bedTypesFacet": { "type": "string", "path": "bed_type", "numBuckets": 3 }
                    }
                }
            } },
            { "$limit": 10 }
        ]))
    }

    #[test]
    fn test_structural_substitution() {
        let p = pipeline(json!([
            { "$search": { "text": { "query": "$$SEARCH_QUERY", "path": "name" } } },
            { "$limit": 10 }
        ]));

        let substituted = substitute_query(p, "loft", SubstitutionMode::Structural).unwrap();

        assert_eq!(
            serde_json::to_value(&substituted).unwrap(),
            json!([
                { "$search": { "text": { "query": "loft", "path": "name" } } },
                { "$limit": 10 }
            ])
        );
    }

    #[test]
    fn test_substitution_replaces_every_occurrence() {
        let p = pipeline(json!([{ "$search": { "compound": {
            "should": [
                { "text": { "query": "$$SEARCH_QUERY", "path": "name" } },
                { "phrase": { "query": "about $$SEARCH_QUERY", "path": "summary" } }
            ]
        } } }]));

        for mode in [SubstitutionMode::Structural, SubstitutionMode::Textual] {
            let substituted = substitute_query(p.clone(), "loft", mode).unwrap();
            let should = &substituted.stages()[0].body()["compound"]["should"];
            assert_eq!(should[0]["text"]["query"], json!("loft"));
            assert_eq!(should[1]["phrase"]["query"], json!("about loft"));
        }
    }

    #[test]
    fn test_substitution_escapes_query_text() {
        let p = pipeline(json!([{ "$search": { "text": { "query": "$$SEARCH_QUERY", "path": "name" } } }]));
        let query = "say \"hi\" \\ bye";

        for mode in [SubstitutionMode::Structural, SubstitutionMode::Textual] {
            let substituted = substitute_query(p.clone(), query, mode).unwrap();
            assert_eq!(
                substituted.stages()[0].body()["text"]["query"],
                json!(query)
            );
        }
    }

    #[test]
    fn test_structural_substitution_leaves_keys_alone() {
        let p = pipeline(json!([{ "$search": { "text": { "query": "x", "path": "name" } } }, { "$project": { "$$SEARCH_QUERY": 1 } }]));

        let structural = substitute_query(p.clone(), "loft", SubstitutionMode::Structural).unwrap();
        assert_eq!(structural, p);

        let textual = substitute_query(p, "loft", SubstitutionMode::Textual).unwrap();
        assert_eq!(textual.stages()[1].body(), &json!({ "loft": 1 }));
    }

    #[test]
    fn test_unmatched_placeholder_is_not_an_error() {
        let p = pipeline(json!([{ "$search": { "text": { "query": "fixed", "path": "name" } } }]));
        let substituted = substitute_query(p.clone(), "loft", SubstitutionMode::Structural).unwrap();
        assert_eq!(substituted, p);
    }

    #[test]
    fn test_assemble_without_selections_only_substitutes() {
        let request = SearchRequest::new(text_design(), "loft");

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            serde_json::to_value(&assembled).unwrap(),
            json!([
                { "$search": { "index": "facets", "text": { "query": "loft", "path": "name" } } },
                { "$limit": 10 }
            ])
        );
    }

    #[test]
    fn test_assemble_with_range_filters() {
        let request = SearchRequest::new(text_design(), "loft").with_filters(
            SelectedFilters::new().with(
                "number_range-beds",
                RangeSelection::new(Some(0.into()), Some(2.into())),
            ),
        );

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            assembled.stages()[0].body(),
            &json!({
                "index": "facets",
                "compound": {
                    "must": [{ "text": { "query": "loft", "path": "name" } }],
                    "filter": [{ "range": { "path": "beds", "gte": 0, "lte": 2 } }]
                }
            })
        );
    }

    #[test]
    fn test_assemble_facets_then_filters_share_one_compound() {
        let design = faceted_design().with_filters(vec![RangeFilterSpec::number_range("beds")]);
        let request = SearchRequest::new(design, "beach")
            .with_facets(SelectedFacets::new().with(
                "bedTypesFacet",
                FacetSelection::Buckets(vec!["Real Bed".to_string()]),
            ))
            .with_filters(SelectedFilters::new().with(
                "number_range-beds",
                RangeSelection::new(None, Some(3.into())),
            ));

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();
        let compound = &assembled.stages()[0].body()["facet"]["operator"]["compound"];

        // Range clauses are prepended after the facet clauses.
        assert_eq!(
            compound["filter"],
            json!([
                { "range": { "path": "beds", "lte": 3 } },
                { "text": { "path": "bed_type", "query": "Real Bed" } }
            ])
        );
        assert_eq!(
            compound["must"],
            json!([{ "text": { "query": "beach", "path": { "wildcard": "*" } } }])
        );
    }

    #[test]
    fn test_empty_selections_still_wrap_in_compound() {
        let request = SearchRequest::new(faceted_design(), "beach")
            .with_facets(SelectedFacets::new().with("bedTypesFacet", FacetSelection::default()));

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            assembled.stages()[0].body()["facet"]["operator"],
            json!({ "compound": {
                "must": [{ "text": { "query": "beach", "path": { "wildcard": "*" } } }],
                "filter": []
            } })
        );
    }

    #[test]
    fn test_undeclared_filter_still_wraps_in_compound() {
        let request = SearchRequest::new(text_design(), "loft").with_filters(
            SelectedFilters::new().with(
                "number_range-undeclared",
                RangeSelection::new(Some(1.into()), None),
            ),
        );

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            assembled.stages()[0].body(),
            &json!({
                "index": "facets",
                "compound": {
                    "must": [{ "text": { "query": "loft", "path": "name" } }],
                    "filter": []
                }
            })
        );
    }

    #[test]
    fn test_assemble_unknown_facet_fails() {
        let request = SearchRequest::new(faceted_design(), "beach").with_facets(
            SelectedFacets::new().with(
                "roomTypeFacet",
                FacetSelection::Buckets(vec!["Private room".to_string()]),
            ),
        );

        assert_eq!(
            PipelineAssembler::default().assemble(&request),
            Err(PipelineError::unknown_facet("roomTypeFacet"))
        );
    }

    #[test]
    fn test_assemble_with_sort_places_sort_before_limit() {
        let request =
            SearchRequest::new(text_design(), "loft").with_sort(SortRequest::descending("beds"));

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            serde_json::to_value(&assembled).unwrap(),
            json!([
                { "$search": {
                    "index": "facets",
                    "compound": { "must": [{ "text": { "query": "loft", "path": "name" } }] }
                } },
                { "$sort": { "beds": -1 } },
                { "$limit": 10 }
            ])
        );
    }

    #[test]
    fn test_browse_pipeline_keeps_facets() {
        let request = SearchRequest::new(faceted_design(), "   ");

        let assembled = PipelineAssembler::default().assemble(&request).unwrap();

        assert_eq!(
            serde_json::to_value(&assembled).unwrap(),
            json!([
                { "$search": {
                    "index": "facets",
                    "facet": {
                        "operator": { "queryString": { "query": "*:*", "defaultPath": "does-not-exists" } },
                        "facets": {
                            "accommodatesFacet": { "type": "number", "path": "accommodates", "boundaries": [1, 3, 5] },
                            "bedTypesFacet": { "type": "string", "path": "bed_type", "numBuckets": 3 }
                        }
                    }
                } },
                { "$limit": 10 }
            ])
        );
    }

    #[test]
    fn test_browse_pipeline_with_exists_operator() {
        let config = AssemblerConfig::default()
            .with_browse_operator(BrowseOperator::Exists {
                path: "_id".to_string(),
            })
            .with_page_size(20);
        let request = SearchRequest::new(text_design(), "");

        let assembled = PipelineAssembler::new(config).assemble(&request).unwrap();

        assert_eq!(
            serde_json::to_value(&assembled).unwrap(),
            json!([
                { "$search": { "index": "facets", "exists": { "path": "_id" } } },
                { "$limit": 20 }
            ])
        );
    }

    #[test]
    fn test_ensure_limit() {
        let without = pipeline(json!([{ "$search": { "exists": { "path": "_id" } } }]));
        let with_limit = ensure_limit(without, 10);
        assert_eq!(with_limit.count_stages(LIMIT_STAGE_NAME), 1);
        assert_eq!(with_limit.stages()[1], Stage::limit(10));

        let already = ensure_limit(with_limit.clone(), 10);
        assert_eq!(already, with_limit);

        let duplicated = pipeline(json!([
            { "$search": { "exists": { "path": "_id" } } },
            { "$limit": 5 },
            { "$project": { "name": 1 } },
            { "$limit": 50 }
        ]));
        let deduplicated = ensure_limit(duplicated, 10);
        assert_eq!(
            serde_json::to_value(&deduplicated).unwrap(),
            json!([
                { "$search": { "exists": { "path": "_id" } } },
                { "$limit": 5 },
                { "$project": { "name": 1 } }
            ])
        );
    }

    #[test]
    fn test_meta_pipeline() {
        let request = SearchRequest::new(faceted_design(), "beach")
            .with_facets(SelectedFacets::new().with(
                "accommodatesFacet",
                FacetSelection::Ranges(vec![(3.into(), 5.into())]),
            ))
            .with_sort(SortRequest::ascending("beds"));

        let meta = PipelineAssembler::default()
            .assemble_meta(&request)
            .unwrap()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!([{ "$searchMeta": {
                "index": "facets",
                "facet": {
                    "operator": { "compound": {
                        "must": [{ "text": { "query": "beach", "path": { "wildcard": "*" } } }],
                        "filter": [{ "range": { "path": "accommodates", "gte": 3, "lt": 5 } }]
                    } },
                    "facets": {
                        "accommodatesFacet": { "type": "number", "path": "accommodates", "boundaries": [1, 3, 5] },
                        "bedTypesFacet": { "type": "string", "path": "bed_type", "numBuckets": 3 }
                    }
                }
            } }])
        );
    }

    #[test]
    fn test_meta_pipeline_for_plain_design() {
        let request = SearchRequest::new(text_design(), "loft");
        assert_eq!(
            PipelineAssembler::default().assemble_meta(&request),
            Ok(None)
        );
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let request = SearchRequest::new(faceted_design(), "beach")
            .with_facets(SelectedFacets::new().with(
                "bedTypesFacet",
                FacetSelection::Buckets(vec!["Futon".to_string(), "Real Bed".to_string()]),
            ))
            .with_sort(SortRequest::descending("beds"));
        let assembler = PipelineAssembler::default();

        let first = serde_json::to_string(&assembler.assemble(&request).unwrap()).unwrap();
        let second = serde_json::to_string(&assembler.assemble(&request).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

//! Filter clause builders.
//!
//! Translate the user's facet bucket choices, range filter bounds and sort
//! request into search engine clause documents and stages.

use hosted_search_shared::{
    FacetConfig, FacetConfigMap, FacetSelection, FilterType, RangeFilterSpec, SelectedFacets,
    SelectedFilters, SortRequest, Stage, SORT_STAGE_NAME,
};
use serde_json::{json, Map, Value};

use crate::errors::PipelineError;

/// Build one filter clause per facet with a non-empty selection.
///
/// * String facets match the selected bucket ids as a single free-text query,
///   joined with `", "`.
/// * Number facets use only the first selected `[min, max)` pair.
///
/// Empty selections are skipped. Clauses follow the selection order.
///
/// # Returns
///
/// * `Ok(Vec<Value>)` - The filter clauses
/// * `Err(PipelineError::UnknownFacet)` - If a selected facet is not configured
/// * `Err(PipelineError::UnrecognizedFacetType)` - If a selected facet is neither `number` nor `string`
/// * `Err(PipelineError::InvalidFacetSelection)` - If the selection does not fit the facet type
pub fn build_facet_filter_clauses(
    selected_facets: &SelectedFacets,
    facets: &FacetConfigMap,
) -> Result<Vec<Value>, PipelineError> {
    let mut clauses = Vec::new();

    for (name, selection) in selected_facets.iter() {
        if selection.is_empty() {
            continue;
        }

        let config = facets
            .get(name)
            .ok_or_else(|| PipelineError::unknown_facet(name.clone()))?;

        let clause = match (config, selection) {
            (FacetConfig::String(facet), FacetSelection::Buckets(bucket_ids)) => json!({
                "text": {
                    "path": facet.path,
                    "query": bucket_ids.join(", "),
                }
            }),
            (FacetConfig::Number(facet), FacetSelection::Ranges(ranges)) => {
                let Some((min, max)) = ranges.first() else {
                    continue;
                };
                json!({
                    "range": {
                        "path": facet.path,
                        "gte": min,
                        "lt": max,
                    }
                })
            }
            (FacetConfig::String(_), FacetSelection::Ranges(_)) => {
                return Err(PipelineError::invalid_facet_selection(format!(
                    "string facet '{}' expects bucket ids, got ranges",
                    name
                )))
            }
            (FacetConfig::Number(_), FacetSelection::Buckets(_)) => {
                return Err(PipelineError::invalid_facet_selection(format!(
                    "number facet '{}' expects [min, max] ranges, got bucket ids",
                    name
                )))
            }
            (config @ FacetConfig::Unrecognized(_), _) => {
                return Err(PipelineError::unrecognized_facet_type(
                    name.clone(),
                    config.type_name(),
                ))
            }
        };

        clauses.push(clause);
    }

    Ok(clauses)
}

/// Build one range clause per declared filter that has a selection.
///
/// Filters are visited in declaration order, which is the order of the
/// output. Only the bounds present in the selection are emitted; a bound of
/// `0` is present.
///
/// # Returns
///
/// * `Ok(Vec<Value>)` - The filter clauses
/// * `Err(PipelineError::InvalidFilterSelection)` - If a selection has neither bound
pub fn build_range_filter_clauses(
    selected_filters: &SelectedFilters,
    declared_filters: &[RangeFilterSpec],
) -> Result<Vec<Value>, PipelineError> {
    let mut clauses = Vec::new();

    for filter in declared_filters {
        let key = filter.key();
        let Some(selection) = selected_filters.get(&key) else {
            continue;
        };

        if selection.is_unbounded() {
            return Err(PipelineError::invalid_filter_selection(format!(
                "filter '{}' has neither min nor max",
                key
            )));
        }

        match filter.filter_type {
            FilterType::NumberRange => {
                let mut range = Map::new();
                range.insert("path".to_string(), Value::from(filter.path.clone()));
                if let Some(min) = &selection.min {
                    range.insert("gte".to_string(), Value::Number(min.clone()));
                }
                if let Some(max) = &selection.max {
                    range.insert("lte".to_string(), Value::Number(max.clone()));
                }
                clauses.push(json!({ "range": range }));
            }
        }
    }

    Ok(clauses)
}

/// Build `{ $sort: { <path>: 1 | -1 } }` for a sort request.
pub fn build_sort_stage(sort: &SortRequest) -> Stage {
    let mut body = Map::new();
    body.insert(sort.path.clone(), Value::from(sort.direction.sign()));
    Stage::new(SORT_STAGE_NAME, Value::Object(body))
}

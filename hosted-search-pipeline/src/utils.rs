//! Utility functions for the pipeline core.

use hosted_search_shared::{DesignDefinition, FacetConfig};
use serde_json::Value;
use tracing::warn;

use crate::errors::PipelineError;
use crate::introspect;

/// Read a nested value by dotted path.
///
/// Splits `dotted_path` on `.` and descends through nested documents (and
/// arrays, for numeric segments). Returns `default` at the first missing
/// segment; never fails on missing intermediate values. A value that is
/// present but `null` is returned as is.
///
/// # Example
///
/// ```
/// use hosted_search_pipeline::get_path;
/// use serde_json::{json, Value};
///
/// let meta = json!({ "facet": { "bedTypesFacet": { "buckets": [] } } });
/// assert_eq!(get_path(&meta, "facet.bedTypesFacet.buckets", &Value::Null), &json!([]));
/// assert_eq!(get_path(&meta, "facet.missing.buckets", &Value::Null), &Value::Null);
/// ```
pub fn get_path<'a>(document: &'a Value, dotted_path: &str, default: &'a Value) -> &'a Value {
    lookup_path(document, dotted_path).unwrap_or(default)
}

/// Read a nested value by dotted path, returning `None` at the first missing segment.
pub fn lookup_path<'a>(document: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    dotted_path
        .split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Validate a design definition before any pipeline is built from it.
///
/// Checks the search index identity, the shape of the template's `$search`
/// stage and the facet configuration. An inconsistent URL configuration is
/// only logged.
///
/// # Returns
///
/// * `Ok(())` - If the design can be assembled
/// * `Err(PipelineError::ValidationError)` - If the index identity or a facet configuration is invalid
/// * `Err(PipelineError::MalformedPipeline)` - If the template has no leading `$search` stage
/// * `Err(PipelineError::NoOperatorFound)` - If the template's operator position is ambiguous
pub fn validate_design(design: &DesignDefinition) -> Result<(), PipelineError> {
    design.validate().map_err(PipelineError::validation)?;

    let stage = introspect::search_stage(&design.pipeline)?;

    for (name, config) in stage.facets().into_iter().flatten() {
        match config {
            FacetConfig::Number(facet) => {
                let boundaries: Vec<f64> = facet
                    .boundaries
                    .iter()
                    .filter_map(|boundary| boundary.as_f64())
                    .collect();
                if boundaries.len() < 2 {
                    return Err(PipelineError::validation(format!(
                        "number facet '{}' needs at least two boundaries",
                        name
                    )));
                }
                if boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(PipelineError::validation(format!(
                        "boundaries of number facet '{}' must be strictly increasing",
                        name
                    )));
                }
            }
            FacetConfig::String(facet) => {
                if facet.num_buckets == 0 {
                    return Err(PipelineError::validation(format!(
                        "string facet '{}' needs a positive numBuckets",
                        name
                    )));
                }
            }
            FacetConfig::Unrecognized(_) => {}
        }
    }

    if let Some(warning) = design.ui.url_config_warning() {
        warn!(design_id = ?design.id, "{}", warning);
    }

    Ok(())
}

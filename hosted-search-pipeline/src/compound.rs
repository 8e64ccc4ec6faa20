//! Compound wrapping.
//!
//! Guarantees that the operator position of a pipeline's `$search` stage holds
//! a `compound` operator, so that filter clauses can be added next to the
//! user's original query operator.
//!
//! Both operations take the pipeline by value and rebuild only the search
//! stage; every other stage is moved over untouched.

use hosted_search_shared::Pipeline;
use serde_json::Value;
use tracing::debug;

use crate::errors::PipelineError;
use crate::introspect::{self, replace_search_stage};
use crate::types::{CompoundOperator, Operator};

/// Wrap the operator at the operator position in `{ compound: { must: [operator] } }`.
///
/// Plain stages keep their ancillary keys (`index`, `highlight`, `count`,
/// `returnStoredSource`, ...); faceted stages keep their facet configuration
/// and only `facet.operator` is rewritten.
///
/// # Returns
///
/// * `Ok(Pipeline)` - The wrapped pipeline, or the input pipeline itself if its
///   operator position already holds a compound operator
/// * `Err(PipelineError::MalformedPipeline)` - If the search stage is missing or malformed
/// * `Err(PipelineError::NoOperatorFound)` - If the operator position does not hold exactly one operator
pub fn wrap_in_compound(pipeline: Pipeline) -> Result<Pipeline, PipelineError> {
    let stage = introspect::search_stage(&pipeline)?;

    if stage.operator().is_compound() {
        debug!("Operator position already holds a compound operator");
        return Ok(pipeline);
    }

    debug!(
        operator = stage.operator().name(),
        faceted = stage.is_faceted(),
        "Wrapping operator in compound.must"
    );
    let wrapped = stage.map_operator(|operator| Operator::Compound(CompoundOperator::with_must(operator)));

    Ok(replace_search_stage(pipeline, wrapped))
}

/// Prepend `clauses` to the `filter` clause of the compound operator.
///
/// New clauses come first, followed by any pre-existing filter clauses in
/// their original order. A missing `filter` clause is created as exactly
/// `clauses`.
///
/// # Returns
///
/// * `Ok(Pipeline)` - The pipeline with the filter clauses added
/// * `Err(PipelineError::CompoundOperatorMissing)` - If the operator position is not
///   a compound operator; call [`wrap_in_compound`] first
pub fn append_filter_clause(
    pipeline: Pipeline,
    clauses: Vec<Value>,
) -> Result<Pipeline, PipelineError> {
    let mut stage = introspect::search_stage(&pipeline)?;

    match stage.operator_mut() {
        Operator::Compound(compound) => {
            debug!(clause_count = clauses.len(), "Prepending filter clauses");
            compound.prepend_filter_clauses(clauses);
        }
        Operator::Named { name, .. } => {
            return Err(PipelineError::compound_operator_missing(format!(
                "operator position holds '{}'; wrap the pipeline in a compound operator first",
                name
            )));
        }
    }

    Ok(replace_search_stage(pipeline, stage))
}

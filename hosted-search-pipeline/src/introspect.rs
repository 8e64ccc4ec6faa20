//! Pipeline introspection.
//!
//! Locates the leading `$search` stage and reports which operator shape it
//! currently has, for both plain and faceted stages.

use hosted_search_shared::{Document, Pipeline, Stage, SEARCH_STAGE_NAME};
use serde_json::Value;

use crate::errors::PipelineError;
use crate::types::{SearchStage, COMPOUND_OPERATOR_NAME, FACET_COLLECTOR_NAME};

/// Returns the body of the `$search` stage at index 0.
///
/// # Returns
///
/// * `Ok(&Document)` - The search stage body
/// * `Err(PipelineError::MalformedPipeline)` - If the pipeline is empty, the first
///   stage is not `$search`, or its body is not a document
pub fn search_stage_body(pipeline: &Pipeline) -> Result<&Document, PipelineError> {
    let first = pipeline
        .first()
        .ok_or_else(|| PipelineError::malformed_pipeline("pipeline has no stages"))?;

    if !first.is_named(SEARCH_STAGE_NAME) {
        return Err(PipelineError::malformed_pipeline(format!(
            "first stage must be {}, found {}",
            SEARCH_STAGE_NAME,
            first.name()
        )));
    }

    first.body().as_object().ok_or_else(|| {
        PipelineError::malformed_pipeline(format!("{} stage body must be a document", SEARCH_STAGE_NAME))
    })
}

/// Returns the typed `$search` stage at index 0.
pub fn search_stage(pipeline: &Pipeline) -> Result<SearchStage, PipelineError> {
    let body = search_stage_body(pipeline)?;
    SearchStage::from_body(Value::Object(body.clone()))
}

/// Returns true if the search stage has a `facet` collector.
pub fn has_facet_operator(pipeline: &Pipeline) -> Result<bool, PipelineError> {
    Ok(search_stage_body(pipeline)?.contains_key(FACET_COLLECTOR_NAME))
}

/// Returns the name of the single operator at the operator position.
///
/// The operator position is `facet.operator` for faceted stages and the stage
/// body minus ancillary keys otherwise.
pub fn operator_name(pipeline: &Pipeline) -> Result<String, PipelineError> {
    Ok(search_stage(pipeline)?.operator().name().to_string())
}

/// Returns true if the operator position holds a `compound` operator.
pub fn has_compound_at_operator_position(pipeline: &Pipeline) -> Result<bool, PipelineError> {
    Ok(operator_name(pipeline)? == COMPOUND_OPERATOR_NAME)
}

/// Store `stage` as the `$search` stage of `pipeline`.
///
/// Only the first stage is replaced; every other stage is moved over untouched.
pub(crate) fn replace_search_stage(mut pipeline: Pipeline, stage: SearchStage) -> Pipeline {
    let stage = Stage::new(SEARCH_STAGE_NAME, stage.into_body());
    match pipeline.stages_mut().first_mut() {
        Some(first) => *first = stage,
        None => pipeline.push(stage),
    }
    pipeline
}

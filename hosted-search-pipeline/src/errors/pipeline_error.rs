//! Pipeline error types.
//!
//! This module defines the unified error type for pipeline introspection,
//! rewriting and assembly, together with the failures of the surrounding
//! search service (request decoding, execution, cancellation).

use thiserror::Error;

/// Unified errors from pipeline operations.
///
/// The first group are local validation and lookup failures raised by the
/// pipeline core; none of them are transient and none are retried. The rest
/// are raised by the search service around it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The `$search` stage is missing, not first, or not a document.
    #[error("Malformed pipeline: {0}")]
    MalformedPipeline(String),

    /// No single query operator could be identified at the operator position.
    #[error("No operator found: {0}")]
    NoOperatorFound(String),

    /// A filter clause was appended to an operator position that is not a compound operator.
    #[error("Compound operator missing: {0}")]
    CompoundOperatorMissing(String),

    /// A selected facet has no entry in the pipeline's facet configuration.
    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    /// A facet configuration has a `type` other than `number` or `string`.
    #[error("Unrecognized type '{type_name}' of facet '{facet}'")]
    UnrecognizedFacetType { facet: String, type_name: String },

    /// A selected range filter could not be decoded or has no bound.
    #[error("Invalid filter selection: {0}")]
    InvalidFilterSelection(String),

    /// A facet selection could not be decoded or does not fit the facet type.
    #[error("Invalid facet selection: {0}")]
    InvalidFacetSelection(String),

    /// Validation error (e.g., missing index name, invalid facet boundaries).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to serialize or deserialize a pipeline document.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The query execution collaborator failed.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// The caller cancelled the search before it completed.
    #[error("Search cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a malformed pipeline error.
    pub fn malformed_pipeline(msg: impl Into<String>) -> Self {
        Self::MalformedPipeline(msg.into())
    }

    /// Create a no operator found error.
    pub fn no_operator_found(msg: impl Into<String>) -> Self {
        Self::NoOperatorFound(msg.into())
    }

    /// Create a compound operator missing error.
    pub fn compound_operator_missing(msg: impl Into<String>) -> Self {
        Self::CompoundOperatorMissing(msg.into())
    }

    /// Create an unknown facet error.
    pub fn unknown_facet(facet: impl Into<String>) -> Self {
        Self::UnknownFacet(facet.into())
    }

    /// Create an unrecognized facet type error.
    pub fn unrecognized_facet_type(facet: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnrecognizedFacetType {
            facet: facet.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an invalid filter selection error.
    pub fn invalid_filter_selection(msg: impl Into<String>) -> Self {
        Self::InvalidFilterSelection(msg.into())
    }

    /// Create an invalid facet selection error.
    pub fn invalid_facet_selection(msg: impl Into<String>) -> Self {
        Self::InvalidFacetSelection(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Returns true if the error was caused by the client's request rather than
    /// by the design definition or the executor.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownFacet(_) | Self::InvalidFilterSelection(_) | Self::InvalidFacetSelection(_)
        )
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

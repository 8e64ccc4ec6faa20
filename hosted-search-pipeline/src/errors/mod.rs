//! Error types for the pipeline core.
//!
//! This module provides a unified error type for pipeline assembly and search execution.

mod pipeline_error;

pub use pipeline_error::PipelineError;

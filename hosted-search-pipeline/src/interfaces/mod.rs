//! Interface definitions for pipeline execution.
//!
//! This module defines the abstract `PipelineExecutor` trait that allows the
//! search service to run assembled pipelines against any backend.

mod pipeline_executor;

pub use pipeline_executor::PipelineExecutor;

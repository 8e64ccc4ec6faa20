//! # Hosted Search
//!
//! Runs one hosted search request: loads a design definition and the user's
//! selections from the environment, assembles the search pipelines and runs
//! them through an executor, producing a `SearchResponse`.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration
//! - [`executor`]: Dry-run pipeline executor

pub mod config;
pub mod executor;

pub use config::{LogFormat, Settings};
pub use executor::DryRunExecutor;

use hosted_search_pipeline::PipelineError;
use thiserror::Error;

/// Errors that can occur during startup or while running a search.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline assembly or execution error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Failed to read the design definition.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

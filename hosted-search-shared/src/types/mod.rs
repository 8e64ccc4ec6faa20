//! This module defines the core data structures and types used across the hosted search crates.
//! It re-exports the pipeline document types used at every serialization boundary.

pub mod design_definition;
pub mod facet;
pub mod filter;
pub mod pipeline;
pub mod search_query;
pub mod search_result;

pub use pipeline::{Document, Pipeline, Stage};

//! # Hosted Search Pipeline
//!
//! This crate turns a hosted search design (an aggregation pipeline template
//! whose first stage is a `$search` stage) plus the user's query text, facet
//! selections, range filters and sort into the pipeline that is executed.
//!
//! It includes the pipeline introspection and compound-wrapping primitives,
//! the filter clause builders, the assembler, and a `SearchService` that runs
//! assembled pipelines through a pluggable `PipelineExecutor`.

pub mod assembler;
pub mod clauses;
pub mod compound;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod introspect;
pub mod request;
pub mod service;
pub mod types;
pub mod utils;

pub use assembler::{
    browse_pipeline, ensure_limit, insert_sort_stage, substitute_query, PipelineAssembler,
};
pub use clauses::{build_facet_filter_clauses, build_range_filter_clauses, build_sort_stage};
pub use compound::{append_filter_clause, wrap_in_compound};
pub use config::{AssemblerConfig, BrowseOperator, SubstitutionMode};
pub use errors::PipelineError;
pub use interfaces::PipelineExecutor;
pub use introspect::{
    has_compound_at_operator_position, has_facet_operator, operator_name, search_stage,
    search_stage_body,
};
pub use request::SearchRequest;
pub use service::{map_search_meta, SearchService};
pub use types::{CompoundOperator, FacetCollector, Operator, SearchShape, SearchStage};
pub use utils::{get_path, lookup_path, validate_design};

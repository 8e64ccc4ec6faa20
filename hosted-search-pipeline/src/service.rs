//! Search service implementation.
//!
//! This module provides the service that runs a search request end to end:
//! design validation, pipeline assembly, execution through a
//! `PipelineExecutor`, and facet metadata mapping.

use hosted_search_shared::{
    Document, FacetBucket, FacetConfigMap, FacetMeta, Pipeline, SearchMeta, SearchResponse,
    SelectedFacets,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::assembler::PipelineAssembler;
use crate::config::AssemblerConfig;
use crate::errors::PipelineError;
use crate::interfaces::PipelineExecutor;
use crate::introspect;
use crate::request::SearchRequest;
use crate::types::FACET_COLLECTOR_NAME;
use crate::utils::validate_design;

/// The main service for running hosted searches.
///
/// Assembles the pipelines for a request and delegates their execution to a
/// `PipelineExecutor`. All operations return `PipelineError` for consistent
/// error handling.
///
/// # Example
///
/// ```no_run
/// use hosted_search_pipeline::{PipelineExecutor, SearchRequest, SearchService};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(
/// #     executor: Box<dyn PipelineExecutor>,
/// #     request: SearchRequest,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let service = SearchService::new(executor);
/// let response = service.search(&request, &CancellationToken::new()).await?;
/// println!("{} documents", response.len());
/// # Ok(())
/// # }
/// ```
pub struct SearchService {
    executor: Box<dyn PipelineExecutor>,
    assembler: PipelineAssembler,
}

impl SearchService {
    /// Create a new SearchService with the default assembler configuration.
    ///
    /// # Arguments
    ///
    /// * `executor` - A boxed implementation of `PipelineExecutor`
    pub fn new(executor: Box<dyn PipelineExecutor>) -> Self {
        Self::with_config(executor, AssemblerConfig::default())
    }

    /// Create a new SearchService with a custom assembler configuration.
    ///
    /// # Arguments
    ///
    /// * `executor` - A boxed implementation of `PipelineExecutor`
    /// * `config` - Page size, browse operator and substitution strategy
    pub fn with_config(executor: Box<dyn PipelineExecutor>, config: AssemblerConfig) -> Self {
        Self {
            executor,
            assembler: PipelineAssembler::new(config),
        }
    }

    /// Run a search request.
    ///
    /// The primary pipeline is always run. For faceted designs the meta
    /// pipeline is run afterwards and its bucket counts are mapped into
    /// `meta.facets`, in facet declaration order.
    ///
    /// # Arguments
    ///
    /// * `request` - The decoded search request
    /// * `cancel` - Caller-owned token; cancelling it abandons the search
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Result documents, facet metadata and the executed pipeline
    /// * `Err(PipelineError::Cancelled)` - If `cancel` fired before the executor returned
    /// * `Err(PipelineError)` - If validation, assembly or execution fails
    #[instrument(
        skip_all,
        fields(
            index = %request.design.search_index.name,
            browse = request.is_browse(),
        )
    )]
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, PipelineError> {
        validate_design(&request.design)?;

        let pipeline = self.assembler.assemble(request)?;
        let docs = self.run(request, &pipeline, cancel).await?;
        info!(
            stage_count = pipeline.len(),
            doc_count = docs.len(),
            "Search pipeline completed"
        );

        let mut response = SearchResponse::new(docs, pipeline);

        if let Some(meta_pipeline) = self.assembler.assemble_meta(request)? {
            let meta_docs = self.run(request, &meta_pipeline, cancel).await?;
            let facets = introspect::search_stage(&response.pipeline)?
                .facets()
                .cloned()
                .unwrap_or_default();
            let meta = map_search_meta(
                meta_docs.first(),
                &facets,
                &request.selected_facets,
            )?;
            info!(facet_count = meta.facets.len(), "Search meta pipeline completed");
            response = response.with_meta(meta);
        }

        Ok(response)
    }

    /// Run one pipeline; any executor failure surfaces as `ExecutionError`.
    async fn run(
        &self,
        request: &SearchRequest,
        pipeline: &Pipeline,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>, PipelineError> {
        let index = &request.design.search_index;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Search cancelled");
                Err(PipelineError::Cancelled)
            }
            result = self.executor.run_pipeline(&index.database_name, &index.collection_name, pipeline) => {
                result.map_err(|e| match e {
                    PipelineError::ExecutionError(_) | PipelineError::Cancelled => e,
                    other => PipelineError::execution(other.to_string()),
                })
            }
        }
    }
}

/// Map the first `$searchMeta` result document into facet metadata.
///
/// Each configured facet reads its buckets from `facet.<name>.buckets`, with
/// the facet name used as a single key even when it contains dots. A facet
/// the engine returned nothing for gets an empty bucket list.
///
/// # Returns
///
/// * `Ok(SearchMeta)` - One entry per configured facet, in declaration order
/// * `Err(PipelineError::SerializationError)` - If a bucket list cannot be decoded
pub fn map_search_meta(
    meta_doc: Option<&Document>,
    facets: &FacetConfigMap,
    selected_facets: &SelectedFacets,
) -> Result<SearchMeta, PipelineError> {
    let collected = meta_doc.and_then(|doc| doc.get(FACET_COLLECTOR_NAME));

    let facets = facets
        .iter()
        .map(|(name, config)| -> Result<FacetMeta, PipelineError> {
            let buckets = collected
                .and_then(|facet| facet.get(name.as_str()))
                .and_then(|facet| facet.get("buckets"));
            let result: Vec<FacetBucket> = match buckets {
                None | Some(Value::Null) => {
                    debug!(facet = %name, "No buckets returned for facet");
                    Vec::new()
                }
                Some(buckets) => serde_json::from_value(buckets.clone())?,
            };

            Ok(FacetMeta {
                name: name.clone(),
                config: config.clone(),
                result,
                selected_bucket_ids: selected_facets.get(name).cloned().unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchMeta { facets })
}

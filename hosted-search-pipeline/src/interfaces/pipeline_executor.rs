//! Pipeline executor trait definition.

use async_trait::async_trait;
use hosted_search_shared::{Document, Pipeline};

use crate::errors::PipelineError;

/// Runs an assembled aggregation pipeline against a collection.
///
/// Implementations are injected into `SearchService`, which keeps pipeline
/// assembly independent of the database driver and allows testing with mock
/// executors.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Run `pipeline` against `database_name.collection_name`.
    ///
    /// # Arguments
    ///
    /// * `database_name` - Database holding the collection
    /// * `collection_name` - Collection the search index is defined on
    /// * `pipeline` - The assembled pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Document>)` - The result documents, in pipeline order
    /// * `Err(PipelineError)` - If the backend rejects or fails the pipeline
    async fn run_pipeline(
        &self,
        database_name: &str,
        collection_name: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, PipelineError>;
}

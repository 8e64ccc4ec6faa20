//! Dry-run pipeline executor.

use async_trait::async_trait;
use hosted_search_pipeline::{PipelineError, PipelineExecutor};
use hosted_search_shared::{Document, Pipeline};
use tracing::info;

/// Logs every pipeline it is asked to run and returns no documents.
///
/// Lets a design be checked end to end without a database connection.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl PipelineExecutor for DryRunExecutor {
    async fn run_pipeline(
        &self,
        database_name: &str,
        collection_name: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, PipelineError> {
        let rendered = serde_json::to_string(pipeline)?;
        info!(
            database = database_name,
            collection = collection_name,
            stage_count = pipeline.len(),
            pipeline = %rendered,
            "Dry run: pipeline not executed"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hosted_search_shared::Stage;

    #[tokio::test]
    async fn test_dry_run_returns_no_documents() {
        let pipeline = Pipeline::new(vec![Stage::limit(10)]);
        let docs = DryRunExecutor
            .run_pipeline("sample_airbnb", "listingsAndReviews", &pipeline)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }
}

//! Hosted Search Main Entry Point
//!
//! Assembles the search pipelines for one design definition and request,
//! runs them through the dry-run executor and prints the search response.

use dotenv::dotenv;
use hosted_search::{AppError, DryRunExecutor, LogFormat, Settings};
use hosted_search_pipeline::{PipelineError, SearchService};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber in the requested format.
///
/// `RUST_LOG` overrides the default per-crate filter.
fn init_tracing(format: LogFormat) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hosted_search=info,hosted_search_pipeline=info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init(),
    };
    installed.map_err(|e| AppError::config(format!("Failed to initialize tracing: {}", e)))?;

    info!(
        service_name = "hosted-search",
        service_version = env!("CARGO_PKG_VERSION"),
        log_format = ?format,
        "Tracing initialized"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing(LogFormat::from_env()?)?;

    let settings = Settings::from_env()?;
    let request = match settings.load_request() {
        Ok(request) => request,
        Err(e) => {
            error!(
                error = %e,
                path = %settings.design_definition_path.display(),
                "Failed to load search request"
            );
            return Err(e);
        }
    };

    info!(
        index = %request.design.search_index.name,
        query = %request.query,
        "Running hosted search"
    );

    // Ctrl-C abandons the in-flight search
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            ctrl_c_token.cancel();
        }
    });

    let service = SearchService::with_config(Box::new(DryRunExecutor), settings.assembler.clone());
    let response = match service.search(&request, &cancel).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, client_error = e.is_client_error(), "Search failed");
            return Err(e.into());
        }
    };

    for doc in &response.docs {
        if let Some(url) = request.design.ui.resolve_url(doc) {
            info!(url = %url, "Result link");
        }
    }

    let rendered = serde_json::to_string_pretty(&response).map_err(PipelineError::from)?;
    println!("{}", rendered);

    info!(doc_count = response.len(), "Hosted search completed");
    Ok(())
}

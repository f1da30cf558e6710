mod analysis;
mod analytics;
mod config;
mod db;
mod errors;
mod extract;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::AnalysisPipeline;
use crate::analytics::{PgScanLog, ScanLogSink, TracingScanLog};
use crate::config::Config;
use crate::db::{create_pool, ensure_scan_log_table};
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-scan v{}", env!("CARGO_PKG_VERSION"));

    // Scan analytics: Postgres when configured, log-only otherwise
    let scan_log: Arc<dyn ScanLogSink> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_scan_log_table(&pool).await?;
            Arc::new(PgScanLog::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, scan logs go to the application log");
            Arc::new(TracingScanLog)
        }
    };

    // Initialize generation client
    let gemini = GeminiClient::new(config.gemini_config());
    if gemini.config().api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every analysis will fail until it is configured");
    }
    info!(
        "Generation client initialized (endpoint: {}, attempts: {}, timeout: {:?})",
        gemini.config().endpoint,
        gemini.config().retry.max_attempts,
        gemini.config().retry.timeout
    );

    let state = AppState {
        pipeline: AnalysisPipeline::new(Arc::new(gemini)),
        scan_log,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

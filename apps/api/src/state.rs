use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::analytics::ScanLogSink;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    /// Where completed scans are recorded. Postgres when `DATABASE_URL` is set.
    pub scan_log: Arc<dyn ScanLogSink>,
    pub config: Config,
}

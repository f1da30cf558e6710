//! Scan analytics — records the outcome of every completed analysis.
//!
//! Only status, score and error code are kept. Resume text and file names
//! never reach a sink.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::analysis::error::AnalysisError;
use crate::models::analysis::AnalysisResult;
use crate::models::scan_log::ScanLogRow;

/// Destination for scan log rows. Carried in `AppState` as `Arc<dyn ScanLogSink>`.
#[async_trait]
pub trait ScanLogSink: Send + Sync {
    async fn record(&self, row: &ScanLogRow) -> anyhow::Result<()>;
}

/// Builds the row for a finished pipeline run.
pub fn scan_log_row(outcome: &Result<AnalysisResult, AnalysisError>) -> ScanLogRow {
    match outcome {
        Ok(result) => ScanLogRow::success(result.ats_score),
        Err(err) => ScanLogRow::failure(err.code()),
    }
}

/// Inserts rows into the `scan_logs` table.
pub struct PgScanLog {
    pool: PgPool,
}

impl PgScanLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanLogSink for PgScanLog {
    async fn record(&self, row: &ScanLogRow) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_logs (id, status, ats_score, error_code, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.id)
        .bind(&row.status)
        .bind(row.ats_score)
        .bind(&row.error_code)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Writes rows to the log only. Used when no database is configured.
pub struct TracingScanLog;

#[async_trait]
impl ScanLogSink for TracingScanLog {
    async fn record(&self, row: &ScanLogRow) -> anyhow::Result<()> {
        info!(
            scan_id = %row.id,
            status = %row.status,
            ats_score = ?row.ats_score,
            error_code = ?row.error_code,
            "scan completed"
        );
        Ok(())
    }
}

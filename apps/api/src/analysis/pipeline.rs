//! Analysis Pipeline — extract → prompt → generate → normalize.
//!
//! Each run is independent: no state is kept between calls, so runs may
//! execute concurrently without coordination.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::error::AnalysisError;
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::{build_analysis_prompt, build_summary_prompt};
use crate::extract::{extract, Document, ExtractedText};
use crate::llm_client::TextGenerator;
use crate::models::analysis::AnalysisResult;

#[derive(Clone)]
pub struct AnalysisPipeline {
    generator: Arc<dyn TextGenerator>,
}

impl AnalysisPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Runs one document through the full pipeline.
    ///
    /// Blank extraction stops the run before any generation call is made.
    pub async fn analyze(&self, document: &Document) -> Result<AnalysisResult, AnalysisError> {
        let text = extract_off_runtime(document.clone()).await;
        if text.is_blank() {
            return Err(AnalysisError::EmptyExtraction);
        }

        let prompt = build_analysis_prompt(text.as_str());
        debug!(
            "Extracted {} chars from {}, prompt is {} chars",
            text.char_count(),
            document.format(),
            prompt.chars().count()
        );

        let raw = self.generator.generate(&prompt).await?;
        let result = normalize(&raw)?;

        for (category, skills) in result.technical_skills.categories() {
            debug!("{category}: {} skill(s)", skills.len());
        }
        info!("Analysis complete: ats_score={}", result.ats_score);
        Ok(result)
    }

    /// Generates a short professional summary for a target role.
    pub async fn summarize(
        &self,
        target_role: &str,
        skills: &[String],
    ) -> Result<String, AnalysisError> {
        let target_role = target_role.trim();
        if target_role.is_empty() {
            return Err(AnalysisError::InvalidInput("role must not be empty".to_string()));
        }

        let prompt = build_summary_prompt(target_role, skills);
        let summary = self.generator.generate(&prompt).await?;
        Ok(summary.trim().to_string())
    }
}

/// Document parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_off_runtime(document: Document) -> ExtractedText {
    match tokio::task::spawn_blocking(move || extract(&document)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Extraction task failed: {e}");
            ExtractedText::default()
        }
    }
}

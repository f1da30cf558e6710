//! Response Normalizer — turns raw model output into a canonical `AnalysisResult`.
//!
//! The model is not a trusted source of structured data: anything that is not
//! exactly the canonical shape is a parse failure, never a partial result.

use crate::analysis::error::AnalysisError;
use crate::models::analysis::{AnalysisResult, MAX_ATS_SCORE};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Pulls the payload out of a fenced block, if there is one.
///
/// A ```` ```json ```` fence wins over a generic one. Only the first fence pair
/// is considered; a missing closing fence takes the rest of the text.
pub fn strip_fences(raw: &str) -> &str {
    let inner = if let Some((_, rest)) = raw.split_once(JSON_FENCE) {
        rest.split_once(FENCE).map_or(rest, |(inner, _)| inner)
    } else if let Some((_, rest)) = raw.split_once(FENCE) {
        rest.split_once(FENCE).map_or(rest, |(inner, _)| inner)
    } else {
        raw
    };
    inner.trim()
}

/// Parses raw model output into the canonical analysis shape.
pub fn normalize(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let payload = strip_fences(raw);

    let result: AnalysisResult =
        serde_json::from_str(payload).map_err(|e| AnalysisError::ResponseParse {
            reason: e.to_string(),
            raw: payload.to_string(),
        })?;

    if result.ats_score > MAX_ATS_SCORE {
        return Err(AnalysisError::ResponseParse {
            reason: format!("ats_score {} is outside 0-{MAX_ATS_SCORE}", result.ats_score),
            raw: payload.to_string(),
        });
    }

    Ok(result)
}

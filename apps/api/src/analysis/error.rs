use thiserror::Error;

use crate::llm_client::GenerationFailure;

/// Why an analysis run produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Could not extract text from file.")]
    EmptyExtraction,

    #[error(transparent)]
    Generation(#[from] GenerationFailure),

    /// `raw` is the exact text the parser was given, kept for diagnosis.
    #[error("Failed to parse AI response: {reason}")]
    ResponseParse { reason: String, raw: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyExtraction => "EMPTY_EXTRACTION",
            Self::Generation(failure) => failure.code(),
            Self::ResponseParse { .. } => "RESPONSE_PARSE_FAILURE",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Diagnostic text worth showing next to a generic failure message.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Generation(failure) => Some(failure.to_string()),
            Self::ResponseParse { raw, .. } => Some(raw.clone()),
            Self::EmptyExtraction | Self::InvalidInput(_) => None,
        }
    }
}

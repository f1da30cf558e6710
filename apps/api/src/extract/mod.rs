//! Text extraction — turns an uploaded PDF or DOCX into one plain-text string.
//!
//! `extract()` never fails: a corrupt or unreadable document yields empty text
//! and a `warn!` diagnostic. Whether empty text is fatal is decided by the
//! analysis pipeline, not here.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

pub mod docx;
pub mod pdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a format from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Resolves a format from an uploaded filename (`resume.PDF` → `Pdf`).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Docx => f.write_str("docx"),
        }
    }
}

/// An uploaded document held in memory. Consumed once by `extract()`.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Bytes,
    format: DocumentFormat,
}

impl Document {
    pub fn new(bytes: impl Into<Bytes>, format: DocumentFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Plain text pulled out of a document. Empty is a valid state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when nothing but whitespace was extracted.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// Failures inside a format reader. Never escapes `extract()`.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX markup error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{part} inflates past {limit} bytes")]
    TooLarge { part: &'static str, limit: u64 },
}

/// Extracts plain text from a document, degrading to empty text on failure.
pub fn extract(document: &Document) -> ExtractedText {
    let result = match document.format() {
        DocumentFormat::Pdf => pdf::extract_pdf_text(document.bytes()),
        DocumentFormat::Docx => docx::extract_docx_text(document.bytes()),
    };

    match result {
        Ok(text) => {
            debug!(
                "Extracted {} chars from {} document",
                text.chars().count(),
                document.format()
            );
            ExtractedText(text)
        }
        Err(e) => {
            warn!("Error reading {}: {e}", document.format());
            ExtractedText::default()
        }
    }
}

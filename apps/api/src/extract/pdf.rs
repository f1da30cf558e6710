use std::panic;

use super::ExtractError;

/// Extracts text page by page and joins the pages with a newline.
///
/// Pages without a text layer (scanned images) contribute an empty string.
/// `pdf-extract` can panic on malformed content streams; that is caught and
/// reported as an ordinary extraction error.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|payload| ExtractError::Pdf(panic_message(payload.as_ref())))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(pages.join("\n"))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("parser panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("parser panicked: {s}")
    } else {
        "parser panicked".to_string()
    }
}

use std::io::{self, Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Cap on the inflated size of `word/document.xml`. Uploads are bounded
/// compressed, which says nothing about what they expand to.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

/// Extracts the text of every `w:p` paragraph in document order, one per line.
///
/// Only runs contribute text: `w:t` content, `w:tab` as a tab, and
/// `w:br` / `w:cr` as a line break. Table cells are plain paragraphs and are
/// included where they appear. A text box's paragraphs follow the paragraph
/// that anchors it; the legacy `mc:Fallback` copy Word writes alongside is
/// skipped.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let xml = read_document_part(bytes, MAX_DOCUMENT_XML_BYTES)?;
    let paragraphs = collect_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn read_document_part(bytes: &[u8], limit: u64) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let part = archive.by_name(DOCUMENT_PART)?;

    // The size in the zip header is not trusted; the read itself is capped.
    let mut buf = Vec::new();
    part.take(limit + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(ExtractError::TooLarge {
            part: DOCUMENT_PART,
            limit,
        });
    }

    String::from_utf8(buf)
        .map_err(|e| ExtractError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn collect_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    // Text boxes nest paragraphs inside runs. Each paragraph claims its slot
    // when it opens, and `open` holds the slots still being filled.
    let mut open: Vec<usize> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                b"mc:Fallback" => {
                    reader.read_to_end(e.name())?;
                }
                _ => {}
            },
            Event::Empty(e) => {
                let current = open.last().copied();
                match (e.name().as_ref(), current) {
                    (b"w:p", _) => paragraphs.push(String::new()),
                    (b"w:tab", Some(i)) if run_depth > 0 => paragraphs[i].push('\t'),
                    (b"w:br" | b"w:cr", Some(i)) if run_depth > 0 => paragraphs[i].push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) if in_text => {
                if let Some(&i) = open.last() {
                    paragraphs[i].push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

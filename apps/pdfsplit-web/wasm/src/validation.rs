//! Upload checks
//!
//! Cheap header checks run before the document is handed to the session, so
//! the user gets a specific message instead of a generic parse error.

use lopdf::{Dictionary, Document};
use serde::Serialize;

const MIN_PDF_SIZE: usize = 8;

/// How far from the end of the file %%EOF may appear
const EOF_WINDOW: usize = 1024;

#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    pub page_count: usize,
    /// Version from the header, e.g. "1.7"
    pub version: String,
    /// Encrypted documents load, but copied pages may not be readable
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Check the header and trailer markers without parsing the document
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(EOF_WINDOW)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

/// Parse the document and report what the upload panel shows
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    check_header(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;
    document_info(&document, bytes)
}

/// Upload info for a document already parsed from `bytes`
pub fn document_info(document: &Document, bytes: &[u8]) -> Result<PdfInfo, String> {
    let page_count = document.get_pages().len();
    if page_count == 0 {
        return Err("PDF has no pages".to_string());
    }

    let info = info_dictionary(document);
    Ok(PdfInfo {
        page_count,
        version: extract_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title: info.and_then(|dict| text_entry(dict, b"Title")),
        author: info.and_then(|dict| text_entry(dict, b"Author")),
    })
}

pub fn check_header(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < MIN_PDF_SIZE {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }
    Ok(())
}

/// Header format: %PDF-1.7
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|version| std::str::from_utf8(version).ok())
        .map(|version| version.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    document.get_object(info_id).ok()?.as_dict().ok()
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    (!text.is_empty()).then_some(text)
}

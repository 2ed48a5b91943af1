//! Plain-text extraction from uploaded document payloads.
//!
//! PDF payloads are parsed with `pdf-extract`; anything else is treated as UTF-8 text.
//! A malformed document is a permanent failure for the request: no partial text is
//! returned and nothing is retried.

use thiserror::Error;

/// Errors raised while extracting text from an uploaded payload.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The payload could not be parsed as a PDF document.
    #[error("Failed to extract PDF text: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
}

/// Supported payload formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Binary PDF document.
    Pdf,
    /// Plain UTF-8 text.
    Text,
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Infer the payload format from the file name, using the PDF magic bytes as a tiebreaker.
pub fn detect_kind(file_name: &str, bytes: &[u8]) -> DocumentKind {
    let lowered = file_name.to_lowercase();
    if lowered.ends_with(".pdf") || bytes.starts_with(PDF_MAGIC) {
        DocumentKind::Pdf
    } else {
        DocumentKind::Text
    }
}

/// Extract the full text of a document payload.
///
/// PDF page text is concatenated with newline separators by the parser. Text payloads
/// are decoded lossily, so stray invalid bytes never fail an otherwise readable upload.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::Pdf => {
            let text = pdf_extract::extract_text_from_mem(bytes)?;
            tracing::debug!(chars = text.len(), "Extracted PDF text");
            Ok(text)
        }
        DocumentKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

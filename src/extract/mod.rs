//! Flat text extraction for every supported format.
//!
//! Extraction is a pure function of the input bytes: it is called both for
//! the operator preview and by the post-redaction verifier, so it must
//! behave identically regardless of how many times it runs.

pub(crate) mod docx;

use crate::document::{Document, FormatKind};
use crate::error::{RedactError, Result};

/// Extracts the flat text view of a loaded document.
pub fn extract_text(doc: &Document) -> Result<String> {
    extract_text_from_bytes(doc.bytes(), doc.format())
}

/// Extracts flat text from an in-memory buffer of the given format.
///
/// PDF pages are concatenated in reading order, DOCX paragraphs in document
/// order, and plain text is decoded as-is.
pub fn extract_text_from_bytes(bytes: &[u8], format: FormatKind) -> Result<String> {
    match format {
        FormatKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| RedactError::Extraction {
                format,
                reason: e.to_string(),
            })
        }
        FormatKind::Docx => docx::extract_docx_text(bytes),
        FormatKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

//! Input file classification and the immutable document handle.
//!
//! Format resolution sniffs content first and falls back to the extension,
//! failing closed on anything unrecognized. A hard size ceiling is enforced
//! before any bytes are processed.

use std::fs;
use std::path::Path;

use crate::error::{RedactError, Result};

/// Hard ceiling on input document size (100 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 100 * 1024 * 1024;

/// Supported document formats.
///
/// `.doc` resolves to [`FormatKind::Docx`]; `.rtf` resolves to
/// [`FormatKind::Text`] (RTF markup is not interpreted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Pdf,
    Docx,
    Text,
}

/// Extensions accepted when content sniffing is inconclusive.
const EXTENSION_MAP: &[(&str, FormatKind)] = &[
    ("pdf", FormatKind::Pdf),
    ("docx", FormatKind::Docx),
    ("doc", FormatKind::Docx),
    ("txt", FormatKind::Text),
    ("text", FormatKind::Text),
    ("rtf", FormatKind::Text),
];

/// Classifies a file by its magic bytes, if recognizable.
fn sniff(bytes: &[u8]) -> Option<FormatKind> {
    if bytes.starts_with(b"%PDF-") {
        Some(FormatKind::Pdf)
    } else if bytes.starts_with(b"PK\x03\x04") {
        // Only zip container we accept is OOXML word processing.
        Some(FormatKind::Docx)
    } else {
        None
    }
}

fn extension_kind(path: &Path) -> Option<FormatKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_MAP
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, kind)| *kind)
}

/// Resolves a path to a supported format.
///
/// Validates existence and the size ceiling, then classifies by content
/// sniffing with extension fallback. Unrecognized inputs are rejected,
/// never guessed.
pub fn resolve_format(path: &Path) -> Result<FormatKind> {
    let meta = fs::metadata(path).map_err(|_| RedactError::NotFound {
        path: path.to_path_buf(),
    })?;

    if meta.len() > MAX_DOCUMENT_BYTES {
        return Err(RedactError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit: MAX_DOCUMENT_BYTES,
        });
    }

    let mut head = [0u8; 8];
    let read = {
        use std::io::Read;
        let mut file = fs::File::open(path).map_err(|e| RedactError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        file.read(&mut head).map_err(|e| RedactError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
    };

    if let Some(kind) = sniff(&head[..read]) {
        // A zip container with no word-processing extension is not a DOCX.
        if kind != FormatKind::Docx || matches!(extension_kind(path), Some(FormatKind::Docx) | None)
        {
            return Ok(kind);
        }
    }

    extension_kind(path).ok_or_else(|| RedactError::UnsupportedType {
        path: path.to_path_buf(),
    })
}

/// Opaque handle over a loaded document: raw bytes plus declared format.
///
/// Immutable once loaded; all redaction happens on working copies of the
/// byte buffer, never in place.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    format: FormatKind,
}

impl Document {
    /// Loads a document, resolving its format first.
    pub fn load(path: &Path) -> Result<Self> {
        let format = resolve_format(path)?;
        let bytes = fs::read(path).map_err(|e| RedactError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { bytes, format })
    }

    /// Wraps an in-memory buffer with a declared format.
    pub fn from_bytes(bytes: Vec<u8>, format: FormatKind) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> FormatKind {
        self.format
    }
}

//! DOCX container access and paragraph text extraction.
//!
//! A DOCX file is a zip archive; the text lives in `word/document.xml` as
//! `<w:t>` runs grouped into `<w:p>` paragraphs. Entry order is preserved on
//! round trips so unrelated parts survive a rewrite byte-for-byte.

use std::io::{Cursor, Read, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::SimpleFileOptions;

use crate::document::FormatKind;
use crate::error::{RedactError, Result};

/// Archive path of the main document part.
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";

fn extraction_error(reason: impl ToString) -> RedactError {
    RedactError::Extraction {
        format: FormatKind::Docx,
        reason: reason.to_string(),
    }
}

/// Reads a DOCX archive into an ordered list of `(entry_name, bytes)`.
pub(crate) fn read_archive(bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(extraction_error)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(extraction_error)?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(extraction_error)?;
        entries.push((name, data));
    }
    Ok(entries)
}

/// Writes entries back into a zip buffer, preserving order.
///
/// Media parts are stored uncompressed, everything else deflated, matching
/// the layout word processors produce.
pub(crate) fn write_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in entries {
        let opts = if name.starts_with("word/media/") {
            stored
        } else {
            deflated
        };
        zip.start_file(name.as_str(), opts)
            .map_err(|e| RedactError::Application {
                reason: format!("docx zip write failed for '{name}': {e}"),
            })?;
        zip.write_all(data).map_err(|e| RedactError::Application {
            reason: format!("docx zip write failed for '{name}': {e}"),
        })?;
    }

    let cursor = zip.finish().map_err(|e| RedactError::Application {
        reason: format!("docx zip finalize failed: {e}"),
    })?;
    Ok(cursor.into_inner())
}

/// Returns the raw bytes of `word/document.xml`.
pub(crate) fn document_part(entries: &[(String, Vec<u8>)]) -> Result<&[u8]> {
    entries
        .iter()
        .find(|(name, _)| name == DOCUMENT_PART)
        .map(|(_, data)| data.as_slice())
        .ok_or_else(|| extraction_error("missing word/document.xml"))
}

/// Extracts paragraph text from a DOCX buffer, one line per paragraph.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let entries = read_archive(bytes)?;
    let xml = document_part(&entries)?;

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => {
                    paragraphs.push(std::mem::take(&mut current));
                    in_text_run = false;
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text_run => {
                current.push_str(&t.unescape().map_err(extraction_error)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(extraction_error(e)),
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n"))
}

//! DOCX redaction via paragraph rewriting.
//!
//! A paragraph containing any accepted target is replaced wholesale: its
//! runs are dropped and a single run is emitted with the target occurrences
//! replaced by block characters. Rewriting at the paragraph level sidesteps
//! targets that span run boundaries, which word processors create freely
//! (spell-check and formatting both split runs mid-word).
//!
//! Paragraph properties (`w:pPr`) are preserved so numbering and styles
//! survive; run formatting is normalized to a fixed redaction style.

use std::io::Cursor;

use quick_xml::escape::escape;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::document::FormatKind;
use crate::error::{RedactError, Result};
use crate::extract::docx::{document_part, read_archive, write_archive, DOCUMENT_PART};
use crate::matching::plan_redaction_spans;

/// Character used to overwrite redacted content in DOCX output.
const BLOCK: char = '\u{2588}';

fn rewrite_error(reason: impl ToString) -> RedactError {
    RedactError::Extraction {
        format: FormatKind::Docx,
        reason: reason.to_string(),
    }
}

/// Redacts a DOCX buffer, returning the rewritten archive.
pub(crate) fn redact_docx(bytes: &[u8], targets: &[&str]) -> Result<Vec<u8>> {
    let entries = read_archive(bytes)?;
    let xml = document_part(&entries)?;
    let rewritten = rewrite_document_xml(xml, targets)?;

    let updated: Vec<(String, Vec<u8>)> = entries
        .iter()
        .map(|(name, data)| {
            if name == DOCUMENT_PART {
                (name.clone(), rewritten.clone())
            } else {
                (name.clone(), data.clone())
            }
        })
        .collect();
    write_archive(&updated)
}

/// Streams the document XML, buffering each paragraph and rewriting the
/// ones that contain a target.
fn rewrite_document_xml(xml: &[u8], targets: &[&str]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut in_paragraph = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(rewrite_error)?;
        match event {
            Event::Start(ref e) if e.name().as_ref() == b"w:p" => {
                in_paragraph = true;
                paragraph.clear();
                paragraph.push(event.into_owned());
            }
            Event::End(ref e) if in_paragraph && e.name().as_ref() == b"w:p" => {
                paragraph.push(event.into_owned());
                in_paragraph = false;
                emit_paragraph(&mut writer, &paragraph, targets)?;
            }
            Event::Eof => break,
            _ if in_paragraph => paragraph.push(event.into_owned()),
            _ => writer.write_event(event).map_err(rewrite_error)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}

fn emit_paragraph(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    events: &[Event<'static>],
    targets: &[&str],
) -> Result<()> {
    let text = paragraph_text(events)?;
    let spans = plan_redaction_spans(&text, targets);

    if spans.is_empty() {
        for event in events {
            writer.write_event(event.clone()).map_err(rewrite_error)?;
        }
        return Ok(());
    }

    let mut blocked = text.clone();
    for span in spans.iter().rev() {
        let width = text[span.start..span.end].chars().count();
        blocked.replace_range(span.start..span.end, &BLOCK.to_string().repeat(width));
    }

    // Original <w:p> start, preserved properties, one normalized run.
    writer
        .write_event(events[0].clone())
        .map_err(rewrite_error)?;
    for event in paragraph_properties(events) {
        writer.write_event(event.clone()).map_err(rewrite_error)?;
    }

    let run = format!(
        "<w:r><w:rPr>\
         <w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\"/>\
         <w:b/><w:sz w:val=\"22\"/><w:color w:val=\"000000\"/>\
         </w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r>",
        escape(&blocked)
    );
    writer
        .write_event(Event::Text(BytesText::from_escaped(run)))
        .map_err(rewrite_error)?;

    writer
        .write_event(events[events.len() - 1].clone())
        .map_err(rewrite_error)
}

/// Concatenates the `<w:t>` runs of a buffered paragraph.
fn paragraph_text(events: &[Event<'static>]) -> Result<String> {
    let mut text = String::new();
    let mut in_text_run = false;
    for event in events {
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Event::Text(t) if in_text_run => {
                text.push_str(&t.unescape().map_err(rewrite_error)?);
            }
            _ => {}
        }
    }
    Ok(text)
}

/// The `<w:pPr>..</w:pPr>` event slice of a buffered paragraph, if present.
fn paragraph_properties<'a>(events: &'a [Event<'static>]) -> &'a [Event<'static>] {
    let mut start = None;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:pPr" => start = Some(i),
            Event::Empty(e) if e.name().as_ref() == b"w:pPr" => return &events[i..=i],
            Event::End(e) if e.name().as_ref() == b"w:pPr" => {
                if let Some(s) = start {
                    return &events[s..=i];
                }
            }
            _ => {}
        }
    }
    &[]
}

//! Destructive PDF redaction.
//!
//! The applier works in two passes over each page. First it extracts
//! positioned words and resolves accepted targets to mask rectangles using
//! whole-word and exact-phrase matching. Then it re-walks the content
//! stream with the same interpreter state, overwriting every glyph whose
//! position falls inside a mask with a space, and appends opaque black
//! rectangles over the masked regions. The text is removed from the
//! content stream itself; the rectangles are cosmetic cover, not the
//! mechanism.
//!
//! Both passes share the advance estimator from the layout interpreter, so
//! a glyph lands in exactly the rectangle its word produced.

use lopdf::content::{Content, Operation};
use lopdf::Object;
use log::{debug, warn};

use crate::document::FormatKind;
use crate::error::{RedactError, Result};
use crate::layout::words::{
    apply, compose, extract_words, glyph_advance, matrix_operands, operand_number, Matrix,
    PositionedWord, IDENTITY,
};
use crate::matching::trim_token;

/// A page region whose glyphs must be removed and covered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MaskRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl MaskRect {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

fn pdf_error(reason: impl ToString) -> RedactError {
    RedactError::Extraction {
        format: FormatKind::Pdf,
        reason: reason.to_string(),
    }
}

/// Redacts a PDF buffer, returning the rewritten (unencrypted) document.
pub(crate) fn redact_pdf(bytes: &[u8], targets: &[&str], padding: f32) -> Result<Vec<u8>> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(pdf_error)?;

    let pages: Vec<(u32, lopdf::ObjectId)> = doc.get_pages().into_iter().collect();
    for (number, page_id) in pages {
        let content = match doc.get_page_content(page_id) {
            Ok(content) => content,
            Err(e) => {
                warn!("page {number}: unreadable content stream ({e}), leaving as-is");
                continue;
            }
        };

        let words = match extract_words(&content, number) {
            Ok(words) => words,
            Err(e) => {
                warn!("page {number}: word extraction failed ({e}), leaving as-is");
                continue;
            }
        };

        let masks = page_masks(&words, targets, padding);
        if masks.is_empty() {
            continue;
        }
        debug!("page {number}: {} mask(s)", masks.len());

        let rewritten = scrub_content(&content, &masks).map_err(|e| RedactError::Application {
            reason: format!("page {number}: content rewrite failed: {e}"),
        })?;
        doc.change_page_content(page_id, rewritten)
            .map_err(|e| RedactError::Application {
                reason: format!("page {number}: content update failed: {e}"),
            })?;
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| RedactError::Application {
        reason: format!("pdf serialization failed: {e}"),
    })?;
    Ok(out)
}

/// Resolves targets to mask rectangles over a page's words.
///
/// Matching is whole-word: a target is tokenized on whitespace and matched
/// against consecutive words, comparing tokens with edge punctuation
/// trimmed. "Doe" masks the word "Doe," but never the "Doe" inside
/// "Doenitz".
pub(crate) fn page_masks(
    words: &[PositionedWord],
    targets: &[&str],
    padding: f32,
) -> Vec<MaskRect> {
    let mut masks = Vec::new();

    for target in targets {
        let tokens: Vec<&str> = target
            .split_whitespace()
            .map(trim_token)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            continue;
        }

        for start in 0..words.len().saturating_sub(tokens.len() - 1) {
            let window = &words[start..start + tokens.len()];
            let hit = window
                .iter()
                .zip(&tokens)
                .all(|(word, token)| trim_token(&word.text) == *token);
            if !hit {
                continue;
            }

            let x0 = window.iter().map(|w| w.x0).fold(f32::INFINITY, f32::min);
            let y0 = window.iter().map(|w| w.y0).fold(f32::INFINITY, f32::min);
            let x1 = window
                .iter()
                .map(|w| w.x1)
                .fold(f32::NEG_INFINITY, f32::max);
            let y1 = window
                .iter()
                .map(|w| w.y1)
                .fold(f32::NEG_INFINITY, f32::max);
            masks.push(MaskRect {
                x0: x0 - padding,
                y0: y0 - padding,
                x1: x1 + padding,
                y1: y1 + padding,
            });
        }
    }

    masks
}

/// Replaces the bytes of a shown string that land inside a mask.
fn scrub_string(
    bytes: &mut [u8],
    masks: &[MaskRect],
    ctm: &Matrix,
    text_matrix: &mut Matrix,
    font_size: f32,
) {
    let (origin_x, origin_y) = apply(ctm, text_matrix[4], text_matrix[5]);
    let mut x = origin_x;
    for b in bytes.iter_mut() {
        let advance = glyph_advance(*b, font_size);
        let mid = x + advance / 2.0;
        if *b != b' ' && masks.iter().any(|m| m.contains(mid, origin_y)) {
            *b = b' ';
        }
        x += advance;
    }
    text_matrix[4] += x - origin_x;
}

/// Opaque black fill over each mask.
pub(crate) fn blackout_operations(masks: &[MaskRect]) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(masks.len() * 5);
    for mask in masks {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "rg",
            vec![0.into(), 0.into(), 0.into()],
        ));
        ops.push(Operation::new(
            "re",
            vec![
                Object::Real(mask.x0),
                Object::Real(mask.y0),
                Object::Real(mask.x1 - mask.x0),
                Object::Real(mask.y1 - mask.y0),
            ],
        ));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }
    ops
}

/// Rewrites one content stream: in-mask glyphs become spaces and blackout
/// rectangles are appended after the original operations.
pub(crate) fn scrub_content(
    content_data: &[u8],
    masks: &[MaskRect],
) -> std::result::Result<Vec<u8>, String> {
    let content = Content::decode(content_data).map_err(|e| e.to_string())?;

    let mut ctm = IDENTITY;
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut text_matrix = IDENTITY;
    let mut line_matrix = IDENTITY;
    let mut in_text = false;
    let mut font_size = 12.0f32;
    let mut leading = 0.0f32;

    let mut operations: Vec<Operation> = Vec::with_capacity(content.operations.len());

    for op in content.operations {
        let mut op = op;
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(&op.operands) {
                    ctm = compose(&ctm, &m);
                }
            }
            "BT" => {
                in_text = true;
                text_matrix = IDENTITY;
                line_matrix = IDENTITY;
            }
            "ET" => in_text = false,
            "Tf" if op.operands.len() >= 2 => {
                if let Some(size) = operand_number(&op.operands[1]) {
                    font_size = size.abs();
                }
            }
            "TL" if !op.operands.is_empty() => {
                if let Some(l) = operand_number(&op.operands[0]) {
                    leading = l;
                }
            }
            "Tm" if in_text => {
                if let Some(m) = matrix_operands(&op.operands) {
                    text_matrix = m;
                    line_matrix = m;
                }
            }
            "Td" | "TD" if in_text && op.operands.len() >= 2 => {
                if let (Some(tx), Some(ty)) = (
                    operand_number(&op.operands[0]),
                    operand_number(&op.operands[1]),
                ) {
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "T*" if in_text => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
            }
            "Tj" if in_text => {
                if let Some(Object::String(bytes, _)) = op.operands.first_mut() {
                    scrub_string(bytes, masks, &ctm, &mut text_matrix, font_size);
                }
            }
            "'" if in_text => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
                if let Some(Object::String(bytes, _)) = op.operands.first_mut() {
                    scrub_string(bytes, masks, &ctm, &mut text_matrix, font_size);
                }
            }
            "\"" if in_text && op.operands.len() >= 3 => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
                if let Object::String(bytes, _) = &mut op.operands[2] {
                    scrub_string(bytes, masks, &ctm, &mut text_matrix, font_size);
                }
            }
            "TJ" if in_text => {
                if let Some(Object::Array(items)) = op.operands.first_mut() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                scrub_string(bytes, masks, &ctm, &mut text_matrix, font_size);
                            }
                            Object::Integer(n) => {
                                text_matrix[4] -= *n as f32 / 1000.0 * font_size;
                            }
                            Object::Real(n) => {
                                text_matrix[4] -= *n / 1000.0 * font_size;
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
        operations.push(op);
    }

    operations.extend(blackout_operations(masks));

    Content { operations }.encode().map_err(|e| e.to_string())
}

//! Positioned word extraction from PDF content streams.
//!
//! A small content-stream interpreter tracks the graphics and text matrices
//! through `q`/`Q`/`cm` and the `BT`..`ET` text operators, estimating glyph
//! advances to assign each word a bounding box in PDF user space (y grows
//! upward). Adjacent fragments within a small tolerance are merged so
//! kerning adjustments do not fragment words.
//!
//! The estimates do not consult font metrics; they only need to be
//! self-consistent, since the same advances drive both word extraction and
//! the in-mask glyph removal in the PDF applier.

use lopdf::content::Content;
use lopdf::Object;

/// Horizontal/vertical tolerance for merging glyph fragments into one word.
pub(crate) const MERGE_TOLERANCE: f32 = 2.0;

/// A word token with page-space geometry.
///
/// Coordinates are PDF user space: `y0` is the baseline, `y1` the top of
/// the nominal glyph box, so `y1 > y0` and larger `y1` means higher on the
/// page.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedWord {
    pub text: String,
    /// 1-based page number.
    pub page: u32,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub font_name: String,
    pub font_size: f32,
}

impl PositionedWord {
    /// Bounding box as `(x0, y0, x1, y1)`.
    pub fn bbox(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    /// Top edge (higher on the page means a larger value).
    pub fn top(&self) -> f32 {
        self.y1
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y0
    }
}

/// Row-vector 2D transform `[a b c d e f]`.
pub(crate) type Matrix = [f32; 6];

pub(crate) const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Composes `outer ∘ inner`: the result maps a point through `inner`, then
/// `outer`.
pub(crate) fn compose(outer: &Matrix, inner: &Matrix) -> Matrix {
    [
        outer[0] * inner[0] + outer[2] * inner[1],
        outer[1] * inner[0] + outer[3] * inner[1],
        outer[0] * inner[2] + outer[2] * inner[3],
        outer[1] * inner[2] + outer[3] * inner[3],
        outer[0] * inner[4] + outer[2] * inner[5] + outer[4],
        outer[1] * inner[4] + outer[3] * inner[5] + outer[5],
    ]
}

pub(crate) fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Numeric operand as f32, if it is one.
pub(crate) fn operand_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

pub(crate) fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = operand_number(obj)?;
    }
    Some(m)
}

/// Estimated advance for one glyph at the given size.
pub(crate) fn glyph_advance(byte: u8, font_size: f32) -> f32 {
    if byte < 128 {
        font_size * 0.55
    } else {
        font_size
    }
}

struct PendingWord {
    text: String,
    x0: f32,
    x1: f32,
    y0: f32,
    font_name: String,
    font_size: f32,
}

/// Accumulates glyphs into words, merging fragments within tolerance.
struct WordScanner {
    page: u32,
    words: Vec<PositionedWord>,
    pending: Option<PendingWord>,
}

impl WordScanner {
    fn new(page: u32) -> Self {
        Self {
            page,
            words: Vec::new(),
            pending: None,
        }
    }

    fn push_glyph(&mut self, byte: u8, x: f32, y: f32, advance: f32, size: f32, font: &str) {
        match &mut self.pending {
            Some(w)
                if (x - w.x1).abs() <= MERGE_TOLERANCE && (y - w.y0).abs() <= MERGE_TOLERANCE =>
            {
                w.text.push(byte as char);
                w.x1 = x + advance;
            }
            _ => {
                self.flush();
                self.pending = Some(PendingWord {
                    text: (byte as char).to_string(),
                    x0: x,
                    x1: x + advance,
                    y0: y,
                    font_name: font.to_string(),
                    font_size: size,
                });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(w) = self.pending.take() {
            if !w.text.trim().is_empty() {
                self.words.push(PositionedWord {
                    text: w.text,
                    page: self.page,
                    x0: w.x0,
                    y0: w.y0,
                    x1: w.x1,
                    y1: w.y0 + w.font_size,
                    font_name: w.font_name,
                    font_size: w.font_size,
                });
            }
        }
    }

    fn finish(mut self) -> Vec<PositionedWord> {
        self.flush();
        self.words
    }
}

fn show_text(
    scanner: &mut WordScanner,
    bytes: &[u8],
    ctm: &Matrix,
    text_matrix: &mut Matrix,
    font_size: f32,
    font_name: &str,
) {
    let (origin_x, origin_y) = apply(ctm, text_matrix[4], text_matrix[5]);
    let mut x = origin_x;
    for &b in bytes {
        let advance = glyph_advance(b, font_size);
        if b == b' ' {
            scanner.flush();
        } else {
            scanner.push_glyph(b, x, origin_y, advance, font_size, font_name);
        }
        x += advance;
    }
    text_matrix[4] += x - origin_x;
}

/// Extracts positioned words from one page's decoded content stream.
///
/// Errors are reported as strings; the caller degrades the page to an empty
/// layout rather than failing the document.
pub(crate) fn extract_words(
    content_data: &[u8],
    page: u32,
) -> std::result::Result<Vec<PositionedWord>, String> {
    let content = Content::decode(content_data).map_err(|e| e.to_string())?;

    let mut ctm = IDENTITY;
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut text_matrix = IDENTITY;
    let mut line_matrix = IDENTITY;
    let mut in_text = false;
    let mut font_size = 12.0f32;
    let mut font_name = String::from("unknown");
    let mut leading = 0.0f32;

    let mut scanner = WordScanner::new(page);

    for op in &content.operations {
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
            "ET" => {
                in_text = false;
                scanner.flush();
            }
            "Tf" if op.operands.len() >= 2 => {
                if let Object::Name(name) = &op.operands[0] {
                    font_name = String::from_utf8_lossy(name).into_owned();
                }
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
                scanner.flush();
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
                scanner.flush();
            }
            "T*" if in_text => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
                scanner.flush();
            }
            "Tj" if in_text => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    show_text(
                        &mut scanner,
                        bytes,
                        &ctm,
                        &mut text_matrix,
                        font_size,
                        &font_name,
                    );
                }
            }
            "'" if in_text => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
                scanner.flush();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    show_text(
                        &mut scanner,
                        bytes,
                        &ctm,
                        &mut text_matrix,
                        font_size,
                        &font_name,
                    );
                }
            }
            "\"" if in_text && op.operands.len() >= 3 => {
                line_matrix[5] -= leading;
                text_matrix = line_matrix;
                scanner.flush();
                if let Object::String(bytes, _) = &op.operands[2] {
                    show_text(
                        &mut scanner,
                        bytes,
                        &ctm,
                        &mut text_matrix,
                        font_size,
                        &font_name,
                    );
                }
            }
            "TJ" if in_text => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                show_text(
                                    &mut scanner,
                                    bytes,
                                    &ctm,
                                    &mut text_matrix,
                                    font_size,
                                    &font_name,
                                );
                            }
                            Object::Integer(n) => {
                                text_matrix[4] -= *n as f32 / 1000.0 * font_size;
                            }
                            Object::Real(n) => {
                                text_matrix[4] -= n / 1000.0 * font_size;
                            }
                            _ => {}
                        }
                    }
                    scanner.flush();
                }
            }
            _ => {}
        }
    }

    Ok(scanner.finish())
}

//! PDF layout analysis: columns, reading zones, and text blocks.
//!
//! The analyzer extracts positioned words per page and clusters them into
//! columns (k-means over x-origins with silhouette-selected k), vertical
//! reading zones, and contiguous text blocks. The resulting geometry is what
//! maps a textual match back to a page region for blackout.
//!
//! Analysis is non-fatal per page: a page that cannot be parsed yields an
//! empty layout and downstream matching simply finds nothing there.

mod cluster;
pub(crate) mod words;

pub use words::PositionedWord;

use std::collections::BTreeMap;

use log::warn;
use rayon::prelude::*;

use crate::document::FormatKind;
use crate::error::{RedactError, Result};

/// Maximum number of columns the detector will consider.
const MAX_COLUMNS: usize = 3;

/// Starting a new reading zone requires a vertical gap above this.
const ZONE_GAP: f32 = 10.0;

/// Text block merge tolerances.
const BLOCK_VERTICAL_GAP: f32 = 5.0;
const BLOCK_HORIZONTAL_GAP: f32 = 20.0;

/// Predominant text direction of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
    Mixed,
}

/// A vertical band of words forming one detected column.
///
/// Columns partition a page's words into non-overlapping horizontal bands,
/// ordered left to right.
#[derive(Debug, Clone)]
pub struct Column {
    /// Horizontal extent `(min x0, max x1)` of the column's words.
    pub x_range: (f32, f32),
    pub words: Vec<PositionedWord>,
}

/// A vertically grouped cluster of words approximating a paragraph or line
/// group, used when the document lacks explicit logical structure.
#[derive(Debug, Clone)]
pub struct ReadingZone {
    /// Top edge in PDF user space (larger is higher on the page).
    pub top: f32,
    pub bottom: f32,
    pub text: String,
    pub words: Vec<PositionedWord>,
}

/// A contiguous run of words in reading order with a merged bounding box.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
    pub words: Vec<PositionedWord>,
}

impl TextBlock {
    pub fn bbox(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.y0, self.x1, self.y1)
    }
}

/// Aggregate font statistics for one page.
#[derive(Debug, Clone, Default)]
pub struct FontStats {
    pub min_size: f32,
    pub max_size: f32,
    pub median_size: f32,
    pub mean_size: f32,
    pub font_counts: BTreeMap<String, usize>,
}

impl FontStats {
    fn from_words(words: &[PositionedWord]) -> Self {
        if words.is_empty() {
            return Self::default();
        }
        let mut sizes: Vec<f32> = words.iter().map(|w| w.font_size).collect();
        sizes.sort_by(f32::total_cmp);
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) / 2.0
        } else {
            sizes[mid]
        };
        let mut font_counts = BTreeMap::new();
        for w in words {
            *font_counts.entry(w.font_name.clone()).or_insert(0) += 1;
        }
        Self {
            min_size: sizes[0],
            max_size: sizes[sizes.len() - 1],
            median_size: median,
            mean_size: sizes.iter().sum::<f32>() / sizes.len() as f32,
            font_counts,
        }
    }
}

/// Layout of a single page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: u32,
    pub columns: Vec<Column>,
    pub text_direction: TextDirection,
    pub reading_zones: Vec<ReadingZone>,
    pub text_blocks: Vec<TextBlock>,
    pub word_count: usize,
    /// Vertical extent of the page's text.
    pub vertical_spread: f32,
    pub font_stats: FontStats,
}

impl PageLayout {
    /// Layout for a page that yielded no words (empty or unparseable).
    pub fn empty(number: u32) -> Self {
        Self {
            number,
            columns: Vec::new(),
            text_direction: TextDirection::Ltr,
            reading_zones: Vec::new(),
            text_blocks: Vec::new(),
            word_count: 0,
            vertical_spread: 0.0,
            font_stats: FontStats::default(),
        }
    }

    /// Rough complexity score: column count, vertical spread, and mixed
    /// direction each contribute.
    pub fn layout_complexity(&self) -> f32 {
        let mut complexity = self.columns.len() as f32 * 0.5;
        complexity += self.vertical_spread.abs() / 100.0;
        if self.text_direction == TextDirection::Mixed {
            complexity += 1.0;
        }
        complexity
    }
}

/// Per-page layouts in input page order.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn total_words(&self) -> usize {
        self.pages.iter().map(|p| p.word_count).sum()
    }
}

/// Analyzes PDF page geometry.
pub struct LayoutAnalyzer;

impl LayoutAnalyzer {
    /// Analyzes every page of a PDF buffer.
    ///
    /// Pages are independent and processed on the rayon pool; the output
    /// order always equals the input page order. A page whose content
    /// stream cannot be interpreted degrades to an empty layout.
    pub fn analyze(bytes: &[u8]) -> Result<DocumentLayout> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| RedactError::Extraction {
            format: FormatKind::Pdf,
            reason: e.to_string(),
        })?;

        let mut page_contents: Vec<(u32, Vec<u8>)> = Vec::new();
        for (number, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => page_contents.push((number, content)),
                Err(e) => {
                    warn!("page {number}: unreadable content stream ({e}), skipping");
                    page_contents.push((number, Vec::new()));
                }
            }
        }

        let pages: Vec<PageLayout> = page_contents
            .par_iter()
            .map(|(number, content)| Self::analyze_page(*number, content))
            .collect();

        Ok(DocumentLayout { pages })
    }

    /// Analyzes a single page's decoded content stream.
    pub(crate) fn analyze_page(number: u32, content: &[u8]) -> PageLayout {
        if content.is_empty() {
            return PageLayout::empty(number);
        }
        let words = match words::extract_words(content, number) {
            Ok(words) => words,
            Err(e) => {
                warn!("page {number}: layout analysis failed ({e}), degrading to empty layout");
                return PageLayout::empty(number);
            }
        };
        Self::layout_from_words(number, words)
    }

    fn layout_from_words(number: u32, words: Vec<PositionedWord>) -> PageLayout {
        if words.is_empty() {
            return PageLayout::empty(number);
        }

        let columns = detect_columns(&words);
        let text_direction = detect_text_direction(&words);
        let reading_zones = identify_reading_zones(&words);
        let text_blocks = extract_text_blocks(&words);
        let vertical_spread = vertical_spread(&words);
        let font_stats = FontStats::from_words(&words);

        PageLayout {
            number,
            columns,
            text_direction,
            reading_zones,
            text_blocks,
            word_count: words.len(),
            vertical_spread,
            font_stats,
        }
    }
}

/// Words sharing a baseline are the same row.
const ROW_TOLERANCE: f32 = 2.0;

/// A horizontal gap wider than this many font sizes splits a row into
/// separate line segments.
const SEGMENT_GAP_FACTOR: f32 = 2.0;

/// Splits words into line segments: runs of words on one baseline with no
/// column-sized gap between them. Each segment belongs to one column.
fn line_segments(words: &[PositionedWord]) -> Vec<Vec<PositionedWord>> {
    let mut sorted: Vec<&PositionedWord> = words.iter().collect();
    sorted.sort_by(|a, b| b.y0.total_cmp(&a.y0).then(a.x0.total_cmp(&b.x0)));

    let mut segments: Vec<Vec<PositionedWord>> = Vec::new();
    let mut row_y = f32::NAN;
    for word in sorted {
        let same_row = (word.y0 - row_y).abs() <= ROW_TOLERANCE;
        let same_segment = same_row
            && segments.last().is_some_and(|seg| {
                seg.last().is_some_and(|prev| {
                    word.x0 - prev.x1 <= prev.font_size * SEGMENT_GAP_FACTOR
                })
            });
        if same_segment {
            if let Some(seg) = segments.last_mut() {
                seg.push(word.clone());
            }
        } else {
            if !same_row {
                row_y = word.y0;
            }
            segments.push(vec![word.clone()]);
        }
    }
    segments
}

/// Clusters line-segment start positions into 1..=3 columns.
///
/// Clustering segment starts rather than every word's origin keeps aligned
/// second words (numbered lists, table cells) from reading as columns.
fn detect_columns(words: &[PositionedWord]) -> Vec<Column> {
    let segments = line_segments(words);
    let starts: Vec<f32> = segments.iter().map(|seg| seg[0].x0).collect();
    let (k, labels) = cluster::best_clustering(&starts, MAX_COLUMNS);

    let mut columns: Vec<Column> = Vec::with_capacity(k);
    for cluster_idx in 0..k {
        let members: Vec<PositionedWord> = segments
            .iter()
            .zip(&labels)
            .filter(|(_, &l)| l == cluster_idx)
            .flat_map(|(seg, _)| seg.iter().cloned())
            .collect();
        if members.is_empty() {
            continue;
        }
        let min_x = members.iter().map(|w| w.x0).fold(f32::INFINITY, f32::min);
        let max_x = members
            .iter()
            .map(|w| w.x1)
            .fold(f32::NEG_INFINITY, f32::max);
        columns.push(Column {
            x_range: (min_x, max_x),
            words: members,
        });
    }
    columns.sort_by(|a, b| a.x_range.0.total_cmp(&b.x_range.0));
    columns
}

/// Classifies direction by the fraction of words progressing left to right.
fn detect_text_direction(words: &[PositionedWord]) -> TextDirection {
    if words.is_empty() {
        return TextDirection::Ltr;
    }
    let ltr = words.iter().filter(|w| w.x1 > w.x0).count();
    let ratio = ltr as f32 / words.len() as f32;
    if ratio > 0.9 {
        TextDirection::Ltr
    } else if ratio < 0.1 {
        TextDirection::Rtl
    } else {
        TextDirection::Mixed
    }
}

/// Groups words top-to-bottom into zones separated by vertical gaps.
fn identify_reading_zones(words: &[PositionedWord]) -> Vec<ReadingZone> {
    let mut sorted: Vec<&PositionedWord> = words.iter().collect();
    sorted.sort_by(|a, b| b.top().total_cmp(&a.top()));

    let mut zones: Vec<ReadingZone> = Vec::new();
    let mut current: Option<ReadingZone> = None;

    for word in sorted {
        match &mut current {
            Some(zone) if zone.bottom - word.top() <= ZONE_GAP => {
                zone.bottom = zone.bottom.min(word.bottom());
                zone.text.push(' ');
                zone.text.push_str(&word.text);
                zone.words.push(word.clone());
            }
            _ => {
                if let Some(done) = current.take() {
                    zones.push(done);
                }
                current = Some(ReadingZone {
                    top: word.top(),
                    bottom: word.bottom(),
                    text: word.text.clone(),
                    words: vec![word.clone()],
                });
            }
        }
    }
    if let Some(done) = current {
        zones.push(done);
    }
    zones
}

/// Merges words in reading order into contiguous text blocks.
fn extract_text_blocks(words: &[PositionedWord]) -> Vec<TextBlock> {
    let mut sorted: Vec<&PositionedWord> = words.iter().collect();
    sorted.sort_by(|a, b| b.top().total_cmp(&a.top()).then(a.x0.total_cmp(&b.x0)));

    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Option<TextBlock> = None;

    for word in sorted {
        let fits = current.as_ref().is_some_and(|block| {
            let vertical_gap = (block.y0 - word.top()).max(0.0);
            let horizontal_gap = word.x0 - block.x1;
            vertical_gap <= BLOCK_VERTICAL_GAP && horizontal_gap <= BLOCK_HORIZONTAL_GAP
        });

        match (&mut current, fits) {
            (Some(block), true) => {
                block.y0 = block.y0.min(word.bottom());
                block.x1 = block.x1.max(word.x1);
                block.x0 = block.x0.min(word.x0);
                block.y1 = block.y1.max(word.top());
                block.text.push(' ');
                block.text.push_str(&word.text);
                block.words.push(word.clone());
            }
            _ => {
                if let Some(done) = current.take() {
                    blocks.push(done);
                }
                current = Some(TextBlock {
                    x0: word.x0,
                    y0: word.bottom(),
                    x1: word.x1,
                    y1: word.top(),
                    text: word.text.clone(),
                    words: vec![word.clone()],
                });
            }
        }
    }
    if let Some(done) = current {
        blocks.push(done);
    }
    blocks
}

fn vertical_spread(words: &[PositionedWord]) -> f32 {
    let top = words.iter().map(|w| w.top()).fold(f32::NEG_INFINITY, f32::max);
    let bottom = words.iter().map(|w| w.bottom()).fold(f32::INFINITY, f32::min);
    if top.is_finite() && bottom.is_finite() {
        top - bottom
    } else {
        0.0
    }
}

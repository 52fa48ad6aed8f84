//! Layout analysis over generated PDFs.

mod common;

use docredact::{LayoutAnalyzer, TextDirection};
use lopdf::content::Operation;
use lopdf::Object;

#[test]
fn test_single_column_page() {
    let bytes = common::pdf_with_lines(&["alpha beta", "gamma delta", "epsilon"]);
    let layout = LayoutAnalyzer::analyze(&bytes).unwrap();

    assert_eq!(layout.pages.len(), 1);
    let page = &layout.pages[0];
    assert_eq!(page.number, 1);
    assert_eq!(page.columns.len(), 1);
    assert_eq!(page.word_count, 5);
    assert_eq!(page.text_direction, TextDirection::Ltr);
}

#[test]
fn test_two_columns_detected_without_overlap() {
    let bytes = common::two_column_pdf();
    let layout = LayoutAnalyzer::analyze(&bytes).unwrap();

    let page = &layout.pages[0];
    assert_eq!(page.columns.len(), 2);
    assert_eq!(page.word_count, 80);
    let (left, right) = (&page.columns[0], &page.columns[1]);
    assert!(left.x_range.1 < right.x_range.0);
    assert_eq!(left.words.len(), right.words.len());
}

#[test]
fn test_analysis_is_deterministic() {
    let bytes = common::two_column_pdf();
    let first = LayoutAnalyzer::analyze(&bytes).unwrap();
    for _ in 0..3 {
        let again = LayoutAnalyzer::analyze(&bytes).unwrap();
        assert_eq!(again.pages.len(), first.pages.len());
        for (a, b) in again.pages.iter().zip(&first.pages) {
            assert_eq!(a.columns.len(), b.columns.len());
            assert_eq!(a.word_count, b.word_count);
            for (ca, cb) in a.columns.iter().zip(&b.columns) {
                assert_eq!(ca.x_range, cb.x_range);
            }
        }
    }
}

#[test]
fn test_reading_zones_split_on_large_gap() {
    // Two lines close together, then one 100pt lower.
    let ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal("heading text")]),
        Operation::new("Td", vec![0.into(), Object::Integer(-16)]),
        Operation::new("Tj", vec![Object::string_literal("subtitle")]),
        Operation::new("Td", vec![0.into(), Object::Integer(-100)]),
        Operation::new("Tj", vec![Object::string_literal("body far below")]),
        Operation::new("ET", vec![]),
    ];
    let bytes = common::pdf_from_page_ops(&[ops]);
    let layout = LayoutAnalyzer::analyze(&bytes).unwrap();

    let page = &layout.pages[0];
    assert_eq!(page.reading_zones.len(), 2);
    assert!(page.reading_zones[0].text.contains("heading"));
    assert!(page.reading_zones[1].text.contains("body"));
    assert!(page.vertical_spread > 100.0);
}

#[test]
fn test_pages_keep_input_order() {
    let bytes = common::pdf_with_pages(&[&["one"], &["two"], &["three"]]);
    let layout = LayoutAnalyzer::analyze(&bytes).unwrap();
    let numbers: Vec<u32> = layout.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(layout.total_words(), 3);
}

#[test]
fn test_empty_page_degrades_gracefully() {
    let bytes = common::pdf_with_pages(&[&["content"], &[]]);
    let layout = LayoutAnalyzer::analyze(&bytes).unwrap();
    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.pages[1].word_count, 0);
    assert!(layout.pages[1].columns.is_empty());
}

#[test]
fn test_garbage_input_is_an_error() {
    assert!(LayoutAnalyzer::analyze(b"definitely not a pdf").is_err());
}

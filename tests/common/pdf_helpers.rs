//! PDF inspection helpers.

use anyhow::Result;

/// Extracts text from an in-memory PDF, the way an adversary would.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow::anyhow!("failed to extract text: {e}"))
}

/// Checks whether any of the patterns survives in the extracted text.
pub fn pdf_contains_any(bytes: &[u8], patterns: &[&str]) -> Result<bool> {
    let text = extract_pdf_text(bytes)?;
    Ok(patterns.iter().any(|p| text.contains(p)))
}

/// Validates that a buffer parses as a PDF document.
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    lopdf::Document::load_mem(bytes).is_ok()
}

/// Counts `re`-then-`f` blackout rectangles across all page content.
pub fn count_blackout_rects(bytes: &[u8]) -> Result<usize> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let mut count = 0;
    for (_, page_id) in doc.get_pages() {
        let content = doc.get_page_content(page_id)?;
        let decoded = lopdf::content::Content::decode(&content)?;
        let ops = &decoded.operations;
        for pair in ops.windows(2) {
            if pair[0].operator == "re" && pair[1].operator == "f" {
                count += 1;
            }
        }
    }
    Ok(count)
}

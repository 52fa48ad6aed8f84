//! Plain-text redaction.

use crate::matching::plan_redaction_spans;

/// Replacement emitted for every redacted span.
pub(crate) const REDACTION_MARKER: &str = "[REDACTED]";

/// Replaces every planned occurrence of the targets with the marker.
///
/// Spans are rewritten back to front so earlier offsets stay valid. The
/// input is decoded lossily; a text file with invalid UTF-8 still redacts,
/// at the cost of replacement characters in untouched regions.
pub(crate) fn redact_text_bytes(bytes: &[u8], targets: &[&str]) -> Vec<u8> {
    let text = String::from_utf8_lossy(bytes);
    redact_text(&text, targets).into_bytes()
}

pub(crate) fn redact_text(text: &str, targets: &[&str]) -> String {
    let spans = plan_redaction_spans(text, targets);
    let mut out = text.to_string();
    for span in spans.iter().rev() {
        out.replace_range(span.start..span.end, REDACTION_MARKER);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_occurrence() {
        let out = redact_text("ssn 123-45-6789 then 123-45-6789", &["123-45-6789"]);
        assert_eq!(out, "ssn [REDACTED] then [REDACTED]");
    }

    #[test]
    fn test_multiple_targets() {
        let out = redact_text(
            "John Doe emailed john@example.com",
            &["John Doe", "john@example.com"],
        );
        assert_eq!(out, "[REDACTED] emailed [REDACTED]");
    }

    #[test]
    fn test_overlapping_targets_prefer_longer() {
        let out = redact_text("number 123-45-6789", &["45", "123-45-6789"]);
        assert_eq!(out, "number [REDACTED]");
        assert!(!out.contains("45"));
    }

    #[test]
    fn test_absent_target_leaves_text_unchanged() {
        let input = "nothing sensitive here";
        assert_eq!(redact_text(input, &["missing"]), input);
    }

    #[test]
    fn test_invalid_utf8_still_redacts() {
        let mut bytes = b"secret ".to_vec();
        bytes.push(0xFF);
        let out = redact_text_bytes(&bytes, &["secret"]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[REDACTED]"));
    }
}

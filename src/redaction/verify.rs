//! Post-apply verification.
//!
//! The redacted bytes are re-extracted with the same extraction path an
//! adversary would use, and every accepted target is searched for. Any
//! survivor fails the whole redaction. If extraction itself breaks on the
//! rewritten output we cannot prove the targets are gone, so that also
//! fails, with every target reported.

use log::warn;

use crate::document::FormatKind;
use crate::error::Result;
use crate::extract;
use crate::redaction::{AcceptedRedactionSet, Verdict};

/// Checks that no accepted target is extractable from redacted bytes.
pub(crate) fn verify_bytes(
    bytes: &[u8],
    format: FormatKind,
    accepted: &AcceptedRedactionSet,
) -> Result<Verdict> {
    let text = match extract::extract_text_from_bytes(bytes, format) {
        Ok(text) => text,
        Err(e) => {
            // Fail closed: unverifiable output is treated as unredacted.
            warn!("verification extraction failed ({e}), failing closed");
            let surviving = accepted.texts().iter().map(|t| t.to_string()).collect();
            return Ok(Verdict::Failed(surviving));
        }
    };

    let surviving: Vec<String> = accepted
        .texts()
        .iter()
        .filter(|target| text.contains(*target))
        .map(|t| t.to_string())
        .collect();

    if surviving.is_empty() {
        Ok(Verdict::Verified)
    } else {
        warn!("{} accepted target(s) survived redaction", surviving.len());
        Ok(Verdict::Failed(surviving))
    }
}

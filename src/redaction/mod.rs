//! The redaction pipeline: accepted targets in, verified artifact out.
//!
//! Redaction is destructive by construction. Text formats rewrite the
//! matched spans, DOCX rewrites whole runs inside `word/document.xml`, and
//! PDF replaces the underlying glyphs before painting opaque rectangles, so
//! the sensitive bytes are gone from the output rather than hidden.
//!
//! Every apply is followed by verification: the output is re-extracted and
//! scanned for each accepted string. A failed verification aborts the run
//! and nothing is written to the destination path.

pub(crate) mod docx;
pub(crate) mod encrypt;
pub(crate) mod pdf;
pub(crate) mod scrub;
pub(crate) mod text;
pub(crate) mod verify;

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::document::{Document, FormatKind};
use crate::error::{RedactError, Result};
use crate::extract;

pub use encrypt::PdfPermissions;

/// Category of sensitive content a redaction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedactionKind {
    /// Personally identifying information: names, addresses, identifiers.
    Pii,
    /// Passwords, keys, tokens.
    Credentials,
    /// Account numbers, amounts, card data.
    Financial,
    /// Operator-defined target with no automatic category.
    Custom,
}

/// One candidate string to redact, either operator-entered or suggested.
#[derive(Debug, Clone)]
pub struct RedactionRequest {
    /// Exact text to remove, matched case-sensitively.
    pub text: String,
    pub kind: RedactionKind,
    /// Detection confidence in 0..=100; operator-entered targets use 100.
    pub confidence: u8,
    /// Human-readable explanation of why this was flagged.
    pub reason: String,
}

impl RedactionRequest {
    /// An operator-entered target, trusted at full confidence.
    pub fn manual(text: impl Into<String>, kind: RedactionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            confidence: 100,
            reason: "manually specified".to_string(),
        }
    }
}

// Identity is the (text, kind) pair; confidence and reason are advisory.
impl PartialEq for RedactionRequest {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.kind == other.kind
    }
}

impl Eq for RedactionRequest {}

impl Hash for RedactionRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.kind.hash(state);
    }
}

/// A match related to an accepted target, found by a suggestion provider.
#[derive(Debug, Clone)]
pub struct ContextualMatch {
    pub text: String,
    /// Confidence in 0..=100, opaque to the engine.
    pub confidence: u8,
    pub reason: String,
}

/// The ordered set of redactions an operator has accepted.
///
/// Insertion order is preserved; duplicates on the `(text, kind)` identity
/// are rejected.
#[derive(Debug, Clone, Default)]
pub struct AcceptedRedactionSet {
    entries: Vec<RedactionRequest>,
}

impl AcceptedRedactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request unless an equal one is already present.
    ///
    /// Returns whether the request was added.
    pub fn accept(&mut self, request: RedactionRequest) -> bool {
        if request.text.is_empty() || self.entries.contains(&request) {
            return false;
        }
        self.entries.push(request);
        true
    }

    /// Accepts a contextual match under the kind of its seed target.
    pub fn accept_contextual(&mut self, related: ContextualMatch, kind: RedactionKind) -> bool {
        self.accept(RedactionRequest {
            text: related.text,
            kind,
            confidence: related.confidence,
            reason: related.reason,
        })
    }

    /// Removes the entry at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<RedactionRequest> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// The distinct target strings, in acceptance order.
    pub fn texts(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|r| r.text.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RedactionRequest> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of post-apply verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No accepted target is extractable from the redacted output.
    Verified,
    /// These accepted targets are still extractable.
    Failed(Vec<String>),
}

/// A successfully redacted and verified output file.
#[derive(Debug)]
pub struct RedactedArtifact {
    pub path: PathBuf,
    pub accepted: AcceptedRedactionSet,
    pub verdict: Verdict,
}

/// Summary of a completed redaction for record keeping.
pub struct AuditReport<'a> {
    pub original: &'a Path,
    pub redacted: &'a Path,
    pub accepted: &'a AcceptedRedactionSet,
}

impl AuditReport<'_> {
    /// Renders a plain-text report listing each redaction by category.
    ///
    /// Target strings never appear in the report; it records counts and
    /// reasons only, so the report itself is safe to retain.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("REDACTION AUDIT REPORT\n");
        out.push_str(&format!("original: {}\n", self.original.display()));
        out.push_str(&format!("redacted: {}\n", self.redacted.display()));
        out.push_str(&format!("redactions applied: {}\n", self.accepted.len()));
        for (i, request) in self.accepted.iter().enumerate() {
            out.push_str(&format!(
                "  {}. kind={:?} confidence={} reason={}\n",
                i + 1,
                request.kind,
                request.confidence,
                request.reason
            ));
        }
        out
    }
}

/// Knobs for how outputs are produced.
#[derive(Debug, Clone)]
pub struct RedactionOptions {
    /// Encrypt PDF outputs with restrictive permissions (RC4-128).
    pub encrypt_pdf_output: bool,
    /// Owner password for encrypted PDFs; empty uses the standard padding.
    pub owner_password: String,
    /// Extra margin in points added around each PDF blackout rectangle.
    pub pdf_padding: f32,
}

impl Default for RedactionOptions {
    fn default() -> Self {
        Self {
            encrypt_pdf_output: true,
            owner_password: String::new(),
            pdf_padding: 2.0,
        }
    }
}

/// Applies accepted redactions to documents and verifies the results.
#[derive(Debug, Default)]
pub struct RedactionEngine {
    options: RedactionOptions,
}

impl RedactionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RedactionOptions) -> Self {
        Self { options }
    }

    /// Extracts the flat text an operator reviews before accepting targets.
    pub fn preview_text(&self, input: &Path) -> Result<String> {
        let doc = Document::load(input)?;
        extract::extract_text(&doc)
    }

    /// Redacts `input` into `output`, verifying before anything is written.
    ///
    /// The apply step runs entirely in memory. Verification re-extracts the
    /// redacted bytes and fails the whole operation if any accepted target
    /// survives; on failure no output file exists. PDF encryption, when
    /// enabled, happens after verification so the check sees the same
    /// content stream the reader will.
    pub fn redact_file(
        &self,
        input: &Path,
        output: &Path,
        accepted: &AcceptedRedactionSet,
    ) -> Result<RedactedArtifact> {
        if accepted.is_empty() {
            return Err(RedactError::InvalidInput {
                parameter: "accepted".to_string(),
                reason: "no redactions accepted".to_string(),
            });
        }

        let doc = Document::load(input)?;
        let format = doc.format();
        info!(
            "redacting {} ({:?}, {} targets)",
            input.display(),
            format,
            accepted.len()
        );

        let targets = accepted.texts();
        let (verifiable, finalized) = match format {
            FormatKind::Text => {
                let redacted = text::redact_text_bytes(doc.bytes(), &targets);
                (redacted.clone(), redacted)
            }
            FormatKind::Docx => {
                let redacted = docx::redact_docx(doc.bytes(), &targets)?;
                (redacted.clone(), redacted)
            }
            FormatKind::Pdf => {
                let plain = pdf::redact_pdf(doc.bytes(), &targets, self.options.pdf_padding)?;
                let finalized = if self.options.encrypt_pdf_output {
                    debug!("encrypting pdf output");
                    encrypt::encrypt_pdf(&plain, &self.options.owner_password)?
                } else {
                    plain.clone()
                };
                (plain, finalized)
            }
        };

        match verify::verify_bytes(&verifiable, format, accepted)? {
            Verdict::Verified => {}
            Verdict::Failed(surviving) => {
                return Err(RedactError::VerificationFailed { surviving });
            }
        }

        scrub::write_final(output, &finalized)?;
        info!("redaction verified, wrote {}", output.display());

        Ok(RedactedArtifact {
            path: output.to_path_buf(),
            accepted: accepted.clone(),
            verdict: Verdict::Verified,
        })
    }
}

//! Document redaction engine with destructive removal and verification.
//!
//! This library redacts sensitive content from PDF, DOCX, and plain-text
//! documents. Redaction is destructive: PDF glyphs are removed from the
//! content stream before black rectangles are painted, DOCX runs are
//! rewritten inside the archive, and text spans are replaced outright.
//! Every redaction is verified by re-extracting the output and proving the
//! accepted targets are gone; a failed verification writes nothing.
//!
//! # Features
//!
//! - **Destructive Redaction**: Removes text from the file, never just a visual overlay
//! - **Verification**: Re-extracts output and fails the run if any target survives
//! - **Layout Analysis**: Column, reading-zone, and text-block detection for PDFs
//! - **Suggestion Hooks**: Pluggable providers propose candidates an operator reviews
//! - **Restricted Output**: Redacted PDFs are encrypted with modification denied
//!
//! # Architecture
//!
//! - [`document`]: Format detection and size-bounded loading
//! - [`extract`]: Flat text extraction per format
//! - [`layout`]: PDF page geometry (columns, zones, blocks)
//! - [`matching`]: Resolving accepted targets to occurrences
//! - [`redaction`]: The apply/verify/write pipeline
//! - [`error`]: Error types shared across the crate
//!
//! # Quick Start
//!
//! ```no_run
//! use docredact::{AcceptedRedactionSet, RedactionEngine, RedactionKind, RedactionRequest};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RedactionEngine::new();
//!
//! let mut accepted = AcceptedRedactionSet::new();
//! accepted.accept(RedactionRequest::manual("123-45-6789", RedactionKind::Pii));
//!
//! let artifact = engine.redact_file(
//!     Path::new("statement.pdf"),
//!     Path::new("statement.redacted.pdf"),
//!     &accepted,
//! )?;
//! println!("wrote {}", artifact.path.display());
//! # Ok(())
//! # }
//! ```

// Public API
pub mod document;
pub mod error;
pub mod extract;
pub mod layout;
pub mod matching;
pub mod redaction;

// Re-exports for convenient access
pub use document::{Document, FormatKind, MAX_DOCUMENT_BYTES};
pub use error::{RedactError, Result};
pub use layout::{
    Column, DocumentLayout, LayoutAnalyzer, PageLayout, PositionedWord, ReadingZone, TextBlock,
    TextDirection,
};
pub use matching::{MatchResolver, Occurrence, SuggestionProvider};
pub use redaction::{
    AcceptedRedactionSet, AuditReport, ContextualMatch, PdfPermissions, RedactedArtifact,
    RedactionEngine, RedactionKind, RedactionOptions, RedactionRequest, Verdict,
};

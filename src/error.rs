//! Error types for the document redaction engine.
//!
//! Errors are categorized by the phase that produced them: input validation,
//! text extraction, redaction application, and post-apply verification.
//! Per-page layout failures are deliberately absent: they degrade to an
//! empty page layout instead of failing the document.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::document::FormatKind;

/// Result type alias for redaction operations.
pub type Result<T> = std::result::Result<T, RedactError>;

/// Comprehensive error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactError {
    /// Input file does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// Input file exceeds the hard size ceiling.
    #[error("file exceeds {limit} byte limit: {path} ({size} bytes)")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// File type could not be recognized by content or extension.
    /// Unrecognized inputs are rejected, never guessed.
    #[error("unsupported file type: {path}")]
    UnsupportedType { path: PathBuf },

    /// Format-specific parse failure while extracting text.
    /// Fatal for the whole document; matching without text is meaningless.
    #[error("text extraction failed ({format:?}): {reason}")]
    Extraction { format: FormatKind, reason: String },

    /// Format-specific failure while applying redactions.
    /// Fatal; partial output is discarded.
    #[error("failed to apply redactions: {reason}")]
    Application { reason: String },

    /// Post-apply verification found accepted texts still recoverable
    /// from the output. The artifact is never exposed in this case.
    #[error("verification failed, recoverable texts remain: {surviving:?}")]
    VerificationFailed { surviving: Vec<String> },

    /// The external suggestion provider reported an error.
    #[error("suggestion provider error: {0}")]
    Suggestion(String),

    /// Invalid configuration or parameters.
    #[error("invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Error occurred while reading or writing files.
    #[error("io error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RedactError {
    /// True when the error is the verification gate firing, i.e. an output
    /// was produced in memory but is not safe to release.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. })
    }
}

impl From<anyhow::Error> for RedactError {
    fn from(err: anyhow::Error) -> Self {
        Self::Suggestion(format!("{err:#}"))
    }
}

//! Locating accepted redaction targets in extracted text.
//!
//! Matching is exact and case-sensitive: an accepted string redacts every
//! occurrence of itself and nothing else. When targets overlap (one accepted
//! string is a substring of another), the longer target claims its spans
//! first so the shorter one cannot split it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RedactError, Result};
use crate::redaction::{ContextualMatch, RedactionKind, RedactionRequest};

static TOKEN_CORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[.,;:!?()\[\]{}'"]*(.*?)[.,;:!?()\[\]{}'"]*$"#)
        .expect("token core pattern is valid")
});

/// Strips leading and trailing punctuation from a token.
///
/// Word-level matching in PDFs compares tokens after trimming, so
/// `"Doe,"` still matches an accepted `"Doe"`.
pub(crate) fn trim_token(token: &str) -> &str {
    TOKEN_CORE
        .captures(token)
        .and_then(|c| c.get(1))
        .map_or(token, |m| m.as_str())
}

/// A byte range of one occurrence of a target in extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
}

/// Supplies machine-generated redaction candidates.
///
/// Implementations wrap whatever detection backend is in use; the engine
/// itself never trusts a suggestion until an operator accepts it.
pub trait SuggestionProvider: Send + Sync {
    /// Proposes redaction candidates for a document's flat text.
    ///
    /// `sensitivity` ranges over 0..=100; higher values should surface more
    /// aggressive (lower-confidence) candidates.
    fn suggest(
        &self,
        document_text: &str,
        sensitivity: u8,
    ) -> anyhow::Result<Vec<RedactionRequest>>;

    /// Finds other occurrences related to an already-accepted seed, such as
    /// the same person referenced by a different spelling.
    fn contextual_matches(
        &self,
        document_text: &str,
        seed_text: &str,
        kind: RedactionKind,
    ) -> anyhow::Result<Vec<ContextualMatch>>;
}

/// Resolves accepted targets to concrete occurrences in extracted text.
pub struct MatchResolver<'a> {
    provider: Option<&'a dyn SuggestionProvider>,
}

impl<'a> MatchResolver<'a> {
    pub fn new() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: &'a dyn SuggestionProvider) -> Self {
        Self { provider: Some(provider) }
    }

    /// Finds every non-overlapping occurrence of `target`, left to right.
    pub fn resolve(&self, text: &str, target: &str) -> Vec<Occurrence> {
        if target.is_empty() {
            return Vec::new();
        }
        text.match_indices(target)
            .map(|(start, m)| Occurrence {
                start,
                end: start + m.len(),
            })
            .collect()
    }

    /// Asks the configured provider for redaction candidates.
    pub fn suggest(&self, text: &str, sensitivity: u8) -> Result<Vec<RedactionRequest>> {
        let provider = self.provider.ok_or_else(|| {
            RedactError::Suggestion("no suggestion provider configured".to_string())
        })?;
        provider
            .suggest(text, sensitivity.min(100))
            .map_err(RedactError::from)
    }

    /// Asks the configured provider for matches contextually related to an
    /// already-accepted target.
    pub fn find_contextual(
        &self,
        text: &str,
        seed: &str,
        kind: RedactionKind,
    ) -> Result<Vec<ContextualMatch>> {
        let provider = self.provider.ok_or_else(|| {
            RedactError::Suggestion("no suggestion provider configured".to_string())
        })?;
        provider
            .contextual_matches(text, seed, kind)
            .map_err(RedactError::from)
    }
}

impl Default for MatchResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Plans non-overlapping redaction spans for a set of targets.
///
/// Targets are considered longest first so that when one accepted string
/// contains another, the containing string wins the span and the substring
/// only claims occurrences outside it. Returned spans are sorted by start.
pub(crate) fn plan_redaction_spans(text: &str, targets: &[&str]) -> Vec<Occurrence> {
    let mut ordered: Vec<&str> = targets.iter().copied().filter(|t| !t.is_empty()).collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    ordered.dedup();

    let mut claimed: Vec<Occurrence> = Vec::new();
    for target in ordered {
        for (start, m) in text.match_indices(target) {
            let end = start + m.len();
            let overlaps = claimed.iter().any(|c| start < c.end && end > c.start);
            if !overlaps {
                claimed.push(Occurrence { start, end });
            }
        }
    }
    claimed.sort_by_key(|c| c.start);
    claimed
}

//! Engine-level behavior: input validation, failure paths, suggestions.

mod common;

use std::fs;

use docredact::{
    AcceptedRedactionSet, ContextualMatch, MatchResolver, RedactError, RedactionEngine,
    RedactionKind, RedactionRequest, SuggestionProvider,
};

fn accepted(targets: &[&str]) -> AcceptedRedactionSet {
    let mut set = AcceptedRedactionSet::new();
    for t in targets {
        set.accept(RedactionRequest::manual(*t, RedactionKind::Custom));
    }
    set
}

#[test]
fn test_empty_accepted_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    let output = dir.path().join("doc.out.txt");
    fs::write(&input, "content").unwrap();

    let err = RedactionEngine::new()
        .redact_file(&input, &output, &AcceptedRedactionSet::new())
        .unwrap_err();
    assert!(matches!(err, RedactError::InvalidInput { .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = RedactionEngine::new()
        .redact_file(
            &dir.path().join("nope.pdf"),
            &dir.path().join("out.pdf"),
            &accepted(&["x"]),
        )
        .unwrap_err();
    assert!(matches!(err, RedactError::NotFound { .. }));
}

#[test]
fn test_unsupported_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("image.png");
    fs::write(&input, b"\x89PNG\r\n\x1a\n").unwrap();

    let err = RedactionEngine::new()
        .redact_file(&input, &dir.path().join("out.png"), &accepted(&["x"]))
        .unwrap_err();
    assert!(matches!(err, RedactError::UnsupportedType { .. }));
}

#[test]
fn test_verification_failure_writes_nothing() {
    // The digits only occur embedded in a larger token, so whole-word PDF
    // masking finds nothing, but the digits remain extractable. The engine
    // must refuse to produce output.
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stuck.pdf");
    let output = dir.path().join("stuck.out.pdf");
    fs::write(&input, common::pdf_with_lines(&["ref code x123y end"])).unwrap();

    let err = RedactionEngine::new()
        .redact_file(&input, &output, &accepted(&["123"]))
        .unwrap_err();

    assert!(err.is_verification_failure());
    let RedactError::VerificationFailed { surviving } = err else {
        panic!("expected verification failure");
    };
    assert_eq!(surviving, vec!["123".to_string()]);
    assert!(!output.exists(), "failed redaction must not leave output");
    // No staging leftovers either.
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1, "only the input remains: {names:?}");
}

struct ScriptedProvider;

impl SuggestionProvider for ScriptedProvider {
    fn suggest(
        &self,
        document_text: &str,
        sensitivity: u8,
    ) -> anyhow::Result<Vec<RedactionRequest>> {
        let mut found = Vec::new();
        if document_text.contains("123-45-6789") {
            found.push(RedactionRequest {
                text: "123-45-6789".to_string(),
                kind: RedactionKind::Pii,
                confidence: 98,
                reason: "matches SSN shape".to_string(),
            });
        }
        if sensitivity >= 80 && document_text.contains("John") {
            found.push(RedactionRequest {
                text: "John".to_string(),
                kind: RedactionKind::Pii,
                confidence: 60,
                reason: "possible given name".to_string(),
            });
        }
        Ok(found)
    }

    fn contextual_matches(
        &self,
        _document_text: &str,
        seed_text: &str,
        _kind: RedactionKind,
    ) -> anyhow::Result<Vec<ContextualMatch>> {
        if seed_text == "John" {
            Ok(vec![ContextualMatch {
                text: "J. Doe".to_string(),
                confidence: 70,
                reason: "same person, abbreviated".to_string(),
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn test_suggestion_accept_redact_flow() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("flow.txt");
    let output = dir.path().join("flow.out.txt");
    fs::write(&input, "John (J. Doe), SSN 123-45-6789").unwrap();

    let engine = RedactionEngine::new();
    let text = engine.preview_text(&input).unwrap();

    let provider = ScriptedProvider;
    let resolver = MatchResolver::with_provider(&provider);

    let mut set = AcceptedRedactionSet::new();
    for suggestion in resolver.suggest(&text, 90).unwrap() {
        let kind = suggestion.kind;
        let seed = suggestion.text.clone();
        set.accept(suggestion);
        for related in resolver.find_contextual(&text, &seed, kind).unwrap() {
            set.accept_contextual(related, kind);
        }
    }
    assert_eq!(set.len(), 3);

    engine.redact_file(&input, &output, &set).unwrap();
    let redacted = fs::read_to_string(&output).unwrap();
    assert!(!redacted.contains("123-45-6789"));
    assert!(!redacted.contains("John"));
    assert!(!redacted.contains("J. Doe"));
}

#[test]
fn test_low_sensitivity_suggests_less() {
    let provider = ScriptedProvider;
    let resolver = MatchResolver::with_provider(&provider);
    let text = "John, SSN 123-45-6789";
    assert_eq!(resolver.suggest(text, 20).unwrap().len(), 1);
    assert_eq!(resolver.suggest(text, 90).unwrap().len(), 2);
}

#[test]
fn test_resolver_occurrences() {
    let resolver = MatchResolver::new();
    let hits = resolver.resolve("a secret, another secret", "secret");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].start, 2);
}

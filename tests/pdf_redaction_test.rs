//! End-to-end redaction of PDF documents.

mod common;

use std::fs;

use docredact::{
    AcceptedRedactionSet, RedactionEngine, RedactionKind, RedactionOptions, RedactionRequest,
};

fn accepted(targets: &[&str]) -> AcceptedRedactionSet {
    let mut set = AcceptedRedactionSet::new();
    for t in targets {
        set.accept(RedactionRequest::manual(*t, RedactionKind::Pii));
    }
    set
}

fn unencrypted_engine() -> RedactionEngine {
    RedactionEngine::with_options(RedactionOptions {
        encrypt_pdf_output: false,
        ..RedactionOptions::default()
    })
}

#[test]
fn test_ssn_is_unextractable_after_redaction() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement.redacted.pdf");
    fs::write(
        &input,
        common::pdf_with_lines(&["Customer: John Doe", "SSN: 123-45-6789", "Balance: 40.00"]),
    )
    .unwrap();

    unencrypted_engine()
        .redact_file(&input, &output, &accepted(&["123-45-6789"]))
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(common::is_valid_pdf(&bytes));
    assert!(!common::pdf_contains_any(&bytes, &["123-45-6789"]).unwrap());
    // The rest of the page survives.
    assert!(common::pdf_contains_any(&bytes, &["Balance"]).unwrap());
}

#[test]
fn test_blackout_rectangle_is_painted() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cover.pdf");
    let output = dir.path().join("cover.out.pdf");
    fs::write(&input, common::pdf_with_lines(&["hide this word"])).unwrap();

    unencrypted_engine()
        .redact_file(&input, &output, &accepted(&["hide"]))
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    assert_eq!(common::count_blackout_rects(&bytes).unwrap(), 1);
}

#[test]
fn test_phrase_across_words_is_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("phrase.pdf");
    let output = dir.path().join("phrase.out.pdf");
    fs::write(
        &input,
        common::pdf_with_lines(&["We met Jane Roe at noon"]),
    )
    .unwrap();

    unencrypted_engine()
        .redact_file(&input, &output, &accepted(&["Jane Roe"]))
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(!common::pdf_contains_any(&bytes, &["Jane", "Roe"]).unwrap());
    assert!(common::pdf_contains_any(&bytes, &["noon"]).unwrap());
}

#[test]
fn test_every_page_is_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("multi.pdf");
    let output = dir.path().join("multi.out.pdf");
    fs::write(
        &input,
        common::pdf_with_pages(&[
            &["page one leak 555-0001"],
            &["clean page"],
            &["page three leak 555-0001"],
        ]),
    )
    .unwrap();

    unencrypted_engine()
        .redact_file(&input, &output, &accepted(&["555-0001"]))
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(!common::pdf_contains_any(&bytes, &["555-0001"]).unwrap());
    assert_eq!(common::count_blackout_rects(&bytes).unwrap(), 2);
}

#[test]
fn test_encrypted_output_has_restrictions() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("locked.pdf");
    let output = dir.path().join("locked.out.pdf");
    fs::write(&input, common::pdf_with_lines(&["secret 42 here"])).unwrap();

    RedactionEngine::new()
        .redact_file(&input, &output, &accepted(&["secret"]))
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    let haystack = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(haystack(b"/Encrypt"), "output must carry an Encrypt dictionary");
    assert!(haystack(b"/Standard"), "standard security handler expected");
    // Content streams are RC4-encrypted, so the plaintext neighbors of the
    // target are not visible in the raw bytes either.
    assert!(!haystack(b"42 here"));
}

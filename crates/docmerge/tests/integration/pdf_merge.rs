//! End-to-end PDF merges.

use docmerge::DocMergeError;
use docmerge::model::MergeKind;
use docmerge::store::DocumentStore;
use lopdf::Document;

use crate::common::{TestEnv, page_texts};

#[tokio::test]
async fn test_merge_pages_in_request_order() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1", "A2"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1", "B2", "B3"], &env.alice).await;

    let outcome = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap();
    assert_eq!(outcome.kind, MergeKind::Pdf);
    assert_eq!(outcome.items, 5);
    assert!(outcome.path.ends_with(".pdf"));

    let texts = page_texts(&env.config.resolve(&outcome.path));
    let expected = ["A1", "A2", "B1", "B2", "B3"];
    assert_eq!(texts.len(), expected.len());
    for (text, label) in texts.iter().zip(expected) {
        assert!(text.contains(&format!("({label})")), "{text} should show {label}");
    }
}

#[tokio::test]
async fn test_reversed_request_reverses_sources() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1", "B2"], &env.alice).await;

    let outcome = env.service.merge_pdfs(&[b, a], &env.alice).await.unwrap();

    let texts = page_texts(&env.config.resolve(&outcome.path));
    assert!(texts[0].contains("(B1)"));
    assert!(texts[1].contains("(B2)"));
    assert!(texts[2].contains("(A1)"));
}

#[tokio::test]
async fn test_pageless_pdf_merges_with_others() {
    let env = TestEnv::new().await;
    let empty = env.upload_pdf("empty.pdf", &[], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1", "B2"], &env.alice).await;

    let outcome = env.service.merge_pdfs(&[empty, b], &env.alice).await.unwrap();
    assert_eq!(outcome.sources, 2);
    assert_eq!(outcome.items, 2);

    let texts = page_texts(&env.config.resolve(&outcome.path));
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("(B1)"));
    assert!(texts[1].contains("(B2)"));
}

#[tokio::test]
async fn test_inherited_page_attributes_survive() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1"], &env.alice).await;

    let outcome = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap();

    let merged = Document::load(env.config.resolve(&outcome.path)).unwrap();
    for page_id in merged.get_pages().into_values() {
        let page = merged.get_dictionary(page_id).unwrap();
        let media_box = match page.get(b"MediaBox") {
            Ok(media_box) => media_box.clone(),
            Err(_) => {
                let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
                merged
                    .get_dictionary(parent)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .clone()
            }
        };
        let media_box = media_box.as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 595);
        assert_eq!(media_box[3].as_i64().unwrap(), 842);
    }
}

#[tokio::test]
async fn test_merged_record_is_created() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1"], &env.alice).await;
    let records_before = env.record_count().await;

    let outcome = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap();

    assert_eq!(env.record_count().await, records_before + 1);
    let doc = env
        .store
        .find_document(outcome.id, &env.alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.title, "Merged PDF");
    assert_eq!(doc.description.as_deref(), Some("Auto-merged PDF file"));
    assert!(std::fs::metadata(env.config.resolve(&doc.file_path)).unwrap().len() > 0);

    // The merged document is itself a valid source.
    let again = env
        .service
        .merge_pdfs(&[outcome.id, a], &env.alice)
        .await
        .unwrap();
    assert_eq!(again.items, 3);
    assert_ne!(again.path, outcome.path);
}

#[tokio::test]
async fn test_fewer_than_two_ids_write_nothing() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let uploads_before = env.upload_count();

    let err = env.service.merge_pdfs(&[a], &env.alice).await.unwrap_err();
    assert!(matches!(
        err,
        DocMergeError::InsufficientInputs {
            kind: MergeKind::Pdf,
            ..
        }
    ));
    assert_eq!(env.upload_count(), uploads_before);
    assert_eq!(env.record_count().await, 1);
}

#[tokio::test]
async fn test_undecodable_source_fails_without_record() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let bogus = env.scratch().join("bogus.pdf");
    std::fs::write(&bogus, b"not a pdf at all").unwrap();
    let b = env.upload(&bogus, &env.alice).await;
    let uploads_before = env.upload_count();

    let err = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap_err();
    assert!(matches!(err, DocMergeError::MergeFailed { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(env.upload_count(), uploads_before);
    assert_eq!(env.record_count().await, 2);
}

//! Owner scoping of merge sources.

use docmerge::DocMergeError;
use docmerge::store::DocumentStore;
use rstest::rstest;

use crate::common::{TestEnv, page_texts};

#[tokio::test]
async fn test_other_owners_documents_are_excluded() {
    let env = TestEnv::new().await;
    let mine = env.upload_pdf("mine.pdf", &["A1"], &env.alice).await;
    let theirs = env.upload_pdf("theirs.pdf", &["B1"], &env.bob).await;

    let err = env
        .service
        .merge_pdfs(&[mine, theirs], &env.alice)
        .await
        .unwrap_err();
    assert!(matches!(err, DocMergeError::InsufficientInputs { found: 1, .. }));
}

#[tokio::test]
async fn test_excluded_source_does_not_block_remaining() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let theirs = env.upload_pdf("theirs.pdf", &["B1"], &env.bob).await;
    let c = env.upload_pdf("c.pdf", &["C1"], &env.alice).await;

    let outcome = env
        .service
        .merge_pdfs(&[a, theirs, c, 9999], &env.alice)
        .await
        .unwrap();
    assert_eq!(outcome.sources, 2);

    let texts = page_texts(&env.config.resolve(&outcome.path));
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("(A1)"));
    assert!(texts[1].contains("(C1)"));
}

#[tokio::test]
async fn test_admin_merges_across_owners() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1"], &env.bob).await;

    let outcome = env.service.merge_pdfs(&[a, b], &env.admin).await.unwrap();
    assert_eq!(outcome.items, 2);

    let doc = env
        .store
        .find_document(outcome.id, &env.admin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.user_id, env.admin.user_id);
    assert!(
        env.store
            .find_document(outcome.id, &env.alice)
            .await
            .unwrap()
            .is_none()
    );
}

#[rstest]
#[case::twice(&[0, 0], 2)]
#[case::three_times(&[0, 0, 0], 3)]
#[tokio::test]
async fn test_repeated_id_contributes_each_time(#[case] picks: &[usize], #[case] pages: usize) {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let ids: Vec<i64> = picks.iter().map(|_| a).collect();

    let outcome = env.service.merge_pdfs(&ids, &env.alice).await.unwrap();
    assert_eq!(outcome.items, pages);
    assert_eq!(outcome.sources, pages);
}

//! Upload, listing, classification and deletion through the library.

use docmerge::DocMergeError;
use docmerge::library::UploadRequest;
use docmerge::model::MergeKind;

use crate::common::{TestEnv, write_pdf};

#[tokio::test]
async fn test_listing_is_scoped_and_newest_first() {
    let env = TestEnv::new().await;
    let first = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let second = env
        .upload_xlsx("b.xlsx", &["K"], &[&["1"]], &env.alice)
        .await;
    let theirs = env.upload_pdf("c.pdf", &["C1"], &env.bob).await;

    let ids: Vec<i64> = env
        .library
        .list(&env.alice)
        .await
        .unwrap()
        .iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(ids, vec![second, first]);

    let all: Vec<i64> = env
        .library
        .list(&env.admin)
        .await
        .unwrap()
        .iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(all, vec![theirs, second, first]);

    let pdfs = env.library.list_paths(MergeKind::Pdf, &env.alice).await.unwrap();
    assert_eq!(pdfs.len(), 1);
    assert!(pdfs[0].ends_with(".pdf"));

    let sheets = env
        .library
        .list_paths(MergeKind::Spreadsheet, &env.admin)
        .await
        .unwrap();
    assert_eq!(sheets.len(), 1);
    assert!(sheets[0].ends_with(".xlsx"));
}

#[tokio::test]
async fn test_upload_keeps_classification() {
    let env = TestEnv::new().await;
    let source = write_pdf(&env.scratch(), "syllabus.pdf", &["S1"]);
    let request = UploadRequest {
        title: "Syllabus".into(),
        description: Some("CS101".into()),
        session: Some("2024-2026".into()),
        semester: Some("Spring".into()),
    };

    let doc = env.library.upload(&source, request, &env.bob).await.unwrap();
    assert_eq!(doc.title, "Syllabus");
    assert_eq!(doc.session.as_deref(), Some("2024-2026"));

    let updated = env
        .library
        .classify(doc.id, None, Some("Fall".into()), &env.admin)
        .await
        .unwrap();
    assert_eq!(updated.session.as_deref(), Some("2024-2026"));
    assert_eq!(updated.semester.as_deref(), Some("Fall"));
}

#[tokio::test]
async fn test_deleted_document_cannot_be_merged() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1"], &env.alice).await;
    let path = env.disk_path(b).await;

    env.library.delete(b, &env.alice).await.unwrap();
    assert!(!path.exists());

    let err = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap_err();
    assert!(matches!(err, DocMergeError::InsufficientInputs { found: 1, .. }));
}

#[tokio::test]
async fn test_download_of_merged_document() {
    let env = TestEnv::new().await;
    let a = env.upload_pdf("a.pdf", &["A1"], &env.alice).await;
    let b = env.upload_pdf("b.pdf", &["B1"], &env.alice).await;
    let outcome = env.service.merge_pdfs(&[a, b], &env.alice).await.unwrap();

    let download = env.library.download(outcome.id, &env.alice).await.unwrap();
    assert_eq!(download.content_type, "application/pdf");
    assert_eq!(download.document.title, "Merged PDF");
    assert_eq!(download.path, env.config.resolve(&outcome.path));

    assert!(matches!(
        env.library.download(outcome.id, &env.bob).await,
        Err(DocMergeError::DocumentNotFound { .. })
    ));
}

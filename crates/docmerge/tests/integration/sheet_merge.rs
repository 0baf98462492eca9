//! End-to-end spreadsheet merges.

use chrono::NaiveDateTime;
use docmerge::DocMergeError;
use docmerge::io::SheetReader;
use docmerge::model::{CellValue, MergeKind};
use docmerge::store::DocumentStore;

use crate::common::{TestEnv, write_dated_xlsx, write_xlsx};

#[tokio::test]
async fn test_merge_rows_under_header_union() {
    let env = TestEnv::new().await;
    let first = env
        .upload_xlsx(
            "term1.xlsx",
            &["Name", "Score"],
            &[&["Ada", "90"], &["Brian", "72"], &["Chen", "85"]],
            &env.alice,
        )
        .await;
    let second = env
        .upload_xlsx(
            "term2.xlsx",
            &["Name", "Grade"],
            &[&["Dana", "C"], &["Eve", "A"]],
            &env.alice,
        )
        .await;

    let outcome = env
        .service
        .merge_spreadsheets(&[first, second], &env.alice)
        .await
        .unwrap();
    assert_eq!(outcome.kind, MergeKind::Spreadsheet);
    assert_eq!(outcome.sources, 2);
    assert_eq!(outcome.items, 5);
    assert!(outcome.path.starts_with("uploads/merged_"));
    assert!(outcome.path.ends_with(".xlsx"));

    let merged = SheetReader::new()
        .load(&env.config.resolve(&outcome.path))
        .await
        .unwrap();
    assert_eq!(merged.headers, vec!["Name", "Score", "Grade"]);
    assert_eq!(merged.rows.len(), 5);

    let names: Vec<String> = merged.rows.iter().map(|row| row["Name"].to_string()).collect();
    assert_eq!(names, vec!["Ada", "Brian", "Chen", "Dana", "Eve"]);

    // Each row only carries the columns its own workbook declared.
    for row in &merged.rows[..3] {
        assert!(row.get("Grade").is_none_or(CellValue::is_empty));
    }
    for row in &merged.rows[3..] {
        assert!(row.get("Score").is_none_or(CellValue::is_empty));
    }
    assert_eq!(merged.rows[4]["Grade"], CellValue::text("A"));
    assert_eq!(merged.rows[0]["Score"], CellValue::Number(90.0));
}

#[tokio::test]
async fn test_merged_record_belongs_to_requester() {
    let env = TestEnv::new().await;
    let a = env
        .upload_xlsx("a.xlsx", &["K"], &[&["1"]], &env.alice)
        .await;
    let b = env
        .upload_xlsx("b.xlsx", &["K"], &[&["2"]], &env.alice)
        .await;

    let outcome = env.service.merge_spreadsheets(&[a, b], &env.alice).await.unwrap();

    let doc = env
        .store
        .find_document(outcome.id, &env.alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.title, "Merged Excel");
    assert_eq!(doc.description.as_deref(), Some("Auto-merged Excel file"));
    assert_eq!(doc.user_id, env.alice.user_id);
    assert!(doc.session.is_none());
    assert!(std::fs::metadata(env.config.resolve(&doc.file_path)).unwrap().len() > 0);

    assert!(
        env.store
            .find_document(outcome.id, &env.bob)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_missing_file_leaves_too_few_sources() {
    let env = TestEnv::new().await;
    let a = env
        .upload_xlsx("a.xlsx", &["K"], &[&["1"]], &env.alice)
        .await;
    let b = env
        .upload_xlsx("b.xlsx", &["K"], &[&["2"]], &env.alice)
        .await;
    std::fs::remove_file(env.disk_path(b).await).unwrap();
    let uploads_before = env.upload_count();

    let err = env
        .service
        .merge_spreadsheets(&[a, b], &env.alice)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocMergeError::InsufficientInputs {
            kind: MergeKind::Spreadsheet,
            found: 1
        }
    ));
    assert_eq!(
        err.user_message(),
        "Please select at least 2 valid Excel files to merge"
    );
    assert_eq!(env.upload_count(), uploads_before);
    assert_eq!(env.record_count().await, 2);
}

#[tokio::test]
async fn test_header_only_workbook_contributes_headers() {
    let env = TestEnv::new().await;
    let a = env
        .upload_xlsx("a.xlsx", &["Name"], &[&["Ada"]], &env.alice)
        .await;
    let path = write_xlsx(&env.scratch(), "empty.xlsx", &["Name", "Room"], &[]);
    let b = env.upload(&path, &env.alice).await;

    let outcome = env.service.merge_spreadsheets(&[a, b], &env.alice).await.unwrap();
    assert_eq!(outcome.items, 1);

    let merged = SheetReader::new()
        .load(&env.config.resolve(&outcome.path))
        .await
        .unwrap();
    assert_eq!(merged.headers, vec!["Name", "Room"]);
}

#[tokio::test]
async fn test_pdf_ids_are_not_spreadsheets() {
    let env = TestEnv::new().await;
    let a = env
        .upload_xlsx("a.xlsx", &["K"], &[&["1"]], &env.alice)
        .await;
    let b = env.upload_pdf("b.pdf", &["P1"], &env.alice).await;

    let err = env
        .service
        .merge_spreadsheets(&[a, b], &env.alice)
        .await
        .unwrap_err();
    assert!(matches!(err, DocMergeError::InsufficientInputs { found: 1, .. }));
}

#[tokio::test]
async fn test_dates_and_fractions_survive_merge() {
    let env = TestEnv::new().await;
    let scratch = env.scratch();
    let first = write_dated_xlsx(
        &scratch,
        "spring.xlsx",
        &[
            ("Ada", "2024-03-01T13:45:17", 91.25),
            ("Brian", "1900-01-15T06:00:00", 0.125),
        ],
    );
    let second = write_dated_xlsx(&scratch, "fall.xlsx", &[("Chen", "1900-03-01T00:00:00", -3.5)]);
    let first = env.upload(&first, &env.alice).await;
    let second = env.upload(&second, &env.alice).await;

    let outcome = env
        .service
        .merge_spreadsheets(&[first, second], &env.alice)
        .await
        .unwrap();
    assert_eq!(outcome.items, 3);

    let merged = SheetReader::new()
        .load(&env.config.resolve(&outcome.path))
        .await
        .unwrap();
    assert_eq!(merged.headers, vec!["Name", "Due", "Score"]);

    let expected = [
        ("Ada", "2024-03-01T13:45:17", 91.25),
        ("Brian", "1900-01-15T06:00:00", 0.125),
        ("Chen", "1900-03-01T00:00:00", -3.5),
    ];
    assert_eq!(merged.rows.len(), expected.len());
    for (row, (name, due, score)) in merged.rows.iter().zip(expected) {
        let due = NaiveDateTime::parse_from_str(due, "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(row["Name"], CellValue::text(name));
        assert_eq!(row["Due"], CellValue::Date(due), "{name}");
        assert_eq!(row["Score"], CellValue::Number(score), "{name}");
    }
}

#![allow(dead_code)]

//! Shared fixtures: a temporary working root with a database, two faculty
//! accounts and an admin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docmerge::Config;
use docmerge::library::{DocumentLibrary, UploadRequest};
use docmerge::model::{Actor, DocumentId, Role};
use docmerge::service::MergeService;
use docmerge::store::{DocumentStore, SqliteStore};
use lopdf::{Document, Object, Stream, dictionary};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

pub struct TestEnv {
    pub dir: TempDir,
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub library: DocumentLibrary<SqliteStore>,
    pub service: MergeService<SqliteStore>,
    pub alice: Actor,
    pub bob: Actor,
    pub admin: Actor,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Config::rooted_at(dir.path());
        let store = Arc::new(SqliteStore::open_path(dir.path().join("docmerge.db")).await.unwrap());

        let alice = store.create_user("alice", "pw", Role::Faculty).await.unwrap().actor();
        let bob = store.create_user("bob", "pw", Role::OfficeUser).await.unwrap().actor();
        assert!(store.provision_admin("admin", "pw").await.unwrap());
        let admin = store.find_user("admin").await.unwrap().unwrap().actor();

        Self {
            library: DocumentLibrary::new(store.clone(), config.clone()),
            service: MergeService::new(store.clone(), config.clone()),
            dir,
            config,
            store,
            alice,
            bob,
            admin,
        }
    }

    /// Directory for source files outside the upload directory.
    pub fn scratch(&self) -> PathBuf {
        let path = self.dir.path().join("scratch");
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    /// Upload `source` as `owner` and return the new document id.
    pub async fn upload(&self, source: &Path, owner: &Actor) -> DocumentId {
        let title = source.file_name().unwrap().to_string_lossy().into_owned();
        let request = UploadRequest {
            title,
            ..Default::default()
        };
        self.library.upload(source, request, owner).await.unwrap().id
    }

    pub async fn upload_pdf(&self, name: &str, page_texts: &[&str], owner: &Actor) -> DocumentId {
        let path = write_pdf(&self.scratch(), name, page_texts);
        self.upload(&path, owner).await
    }

    pub async fn upload_xlsx(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[&[&str]],
        owner: &Actor,
    ) -> DocumentId {
        let path = write_xlsx(&self.scratch(), name, headers, rows);
        self.upload(&path, owner).await
    }

    /// On-disk path of a stored document.
    pub async fn disk_path(&self, id: DocumentId) -> PathBuf {
        let doc = self.store.find_document(id, &self.admin).await.unwrap().unwrap();
        self.config.resolve(&doc.file_path)
    }

    /// Number of files currently in the upload directory.
    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(self.config.upload_root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Number of document records across all owners.
    pub async fn record_count(&self) -> usize {
        self.store.list_documents(&self.admin).await.unwrap().len()
    }
}

/// Write a PDF with one page per entry, each page showing its text.
pub fn write_pdf(dir: &Path, name: &str, page_texts: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = page_texts
        .iter()
        .map(|text| {
            let content = format!("BT /F1 18 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    // MediaBox and Resources are inherited from the tree root.
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a one-sheet workbook; numeric strings become number cells and
/// empty strings stay blank.
pub fn write_xlsx(dir: &Path, name: &str, headers: &[&str], rows: &[&[&str]]) -> PathBuf {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            let (r, col) = (r as u32 + 1, col as u16);
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) => sheet.write_number(r, col, n).unwrap(),
                Err(_) => sheet.write_string(r, col, *value).unwrap(),
            };
        }
    }

    let path = dir.join(name);
    workbook.save(&path).unwrap();
    path
}

/// Write a `Name`/`Due`/`Score` workbook; `Due` holds ISO 8601 date-times
/// stored as date-formatted serials.
pub fn write_dated_xlsx(dir: &Path, name: &str, rows: &[(&str, &str, f64)]) -> PathBuf {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Name", "Due", "Score"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, (label, due, score)) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        let due = ExcelDateTime::parse_from_str(due).unwrap();
        sheet.write_string(r, 0, *label).unwrap();
        sheet.write_datetime_with_format(r, 1, &due, &date_format).unwrap();
        sheet.write_number(r, 2, *score).unwrap();
    }

    let path = dir.join(name);
    workbook.save(&path).unwrap();
    path
}

/// Text shown on each page, in page order.
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

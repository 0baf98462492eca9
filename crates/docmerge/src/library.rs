//! Document library: upload, listing, download, classification and deletion.
//!
//! The library pairs the [`DocumentStore`] with files in the upload
//! directory. Stored paths are relative to [`Config::working_root`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DocMergeError, Result};
use crate::model::{Actor, Document, DocumentId, MergeKind, NewDocument};
use crate::store::DocumentStore;
use crate::utils::{content_type_for, extension_of, upload_file_name};

/// Extensions accepted for upload.
pub const UPLOAD_EXTENSIONS: [&str; 3] = ["xlsx", "pdf", "docx"];

/// Descriptive fields supplied with an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Required display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional session classification.
    pub session: Option<String>,
    /// Optional semester classification.
    pub semester: Option<String>,
}

/// A document resolved for download.
#[derive(Debug, Clone)]
pub struct Download {
    /// The document record.
    pub document: Document,
    /// On-disk location of the file.
    pub path: PathBuf,
    /// MIME type for the file.
    pub content_type: &'static str,
}

/// Uploads, lists, serves and deletes stored documents.
pub struct DocumentLibrary<S> {
    store: Arc<S>,
    config: Config,
}

impl<S: DocumentStore> DocumentLibrary<S> {
    /// Create a library over `store`.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self { store, config }
    }

    /// Copy `source` into the upload directory and record it for `actor`.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::InvalidConfig`] if the title is blank
    /// - [`DocMergeError::UnsupportedFileType`] for extensions other than
    ///   `.xlsx`, `.pdf` and `.docx`
    /// - [`DocMergeError::FileNotFound`] if `source` does not exist
    /// - [`DocMergeError::WriteFailed`] if the copy fails
    pub async fn upload(
        &self,
        source: &Path,
        request: UploadRequest,
        actor: &Actor,
    ) -> Result<Document> {
        if request.title.trim().is_empty() {
            return Err(DocMergeError::invalid_config("Title is required"));
        }

        let extension = extension_of(source)
            .filter(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| DocMergeError::UnsupportedFileType {
                path: source.to_path_buf(),
            })?;

        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(DocMergeError::FileNotFound {
                path: source.to_path_buf(),
            });
        }

        let upload_root = self.config.upload_root();
        tokio::fs::create_dir_all(&upload_root)
            .await
            .map_err(|e| DocMergeError::write_failed(&upload_root, e))?;

        let (file_name, target, file) = loop {
            let name = upload_file_name(&extension);
            let candidate = upload_root.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => break (name, candidate, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DocMergeError::write_failed(&candidate, e)),
            }
        };

        if let Err(e) = copy_into(source, file).await {
            discard_upload(&target).await;
            return Err(DocMergeError::write_failed(&target, e));
        }

        let record = NewDocument {
            title: request.title,
            description: request.description,
            file_path: self.config.stored_path(&file_name),
            user_id: actor.user_id,
            session: request.session,
            semester: request.semester,
        };

        let id = match self.store.insert_document(record).await {
            Ok(id) => id,
            Err(e) => {
                discard_upload(&target).await;
                return Err(e);
            }
        };

        info!(id, path = %target.display(), "uploaded document");
        self.fetch(id, actor).await
    }

    /// Documents visible to `actor`, newest first.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Document>> {
        self.store.list_documents(actor).await
    }

    /// Stored paths of visible documents of one kind.
    pub async fn list_paths(&self, kind: MergeKind, actor: &Actor) -> Result<Vec<String>> {
        self.store.list_paths(kind, actor).await
    }

    /// Resolve a document's file for download.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::DocumentNotFound`] if the record is missing or not
    ///   visible to `actor`
    /// - [`DocMergeError::FileNotFound`] if the file is gone from disk
    pub async fn download(&self, id: DocumentId, actor: &Actor) -> Result<Download> {
        let document = self.fetch(id, actor).await?;
        let path = self.config.resolve(&document.file_path);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(DocMergeError::FileNotFound { path });
        }

        Ok(Download {
            content_type: content_type_for(&path),
            document,
            path,
        })
    }

    /// Remove a document's file, then its record.
    ///
    /// A file that is already gone does not prevent the record from being
    /// deleted.
    pub async fn delete(&self, id: DocumentId, actor: &Actor) -> Result<()> {
        let document = self.fetch(id, actor).await?;
        let path = self.config.resolve(&document.file_path);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(id, path = %path.display(), "deleting record whose file is already gone");
            }
            Err(e) => return Err(e.into()),
        }

        if !self.store.delete_document(id, actor).await? {
            return Err(DocMergeError::DocumentNotFound { id });
        }

        info!(id, "deleted document");
        Ok(())
    }

    /// Update a document's session and semester.
    ///
    /// `None` leaves a field unchanged.
    pub async fn classify(
        &self,
        id: DocumentId,
        session: Option<String>,
        semester: Option<String>,
        actor: &Actor,
    ) -> Result<Document> {
        if !self
            .store
            .update_classification(id, session, semester, actor)
            .await?
        {
            return Err(DocMergeError::DocumentNotFound { id });
        }
        self.fetch(id, actor).await
    }

    async fn fetch(&self, id: DocumentId, actor: &Actor) -> Result<Document> {
        self.store
            .find_document(id, actor)
            .await?
            .ok_or(DocMergeError::DocumentNotFound { id })
    }
}

/// Copy `source` into the freshly created `target` file.
async fn copy_into(source: &Path, mut target: File) -> io::Result<()> {
    let mut reader = File::open(source).await?;
    tokio::io::copy(&mut reader, &mut target).await?;
    target.sync_all().await
}

/// Remove a stored upload that will not be recorded.
async fn discard_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove unrecorded upload");
    }
}

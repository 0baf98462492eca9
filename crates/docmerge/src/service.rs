//! Merge orchestration.
//!
//! A merge request is a list of document ids plus the kind of merge to
//! perform. The service narrows the list down to sources that are
//! authorized, of the right type and present on disk; reads them; merges
//! them; writes the result; and records it as a new document owned by the
//! caller. Any failure before the record is inserted leaves the database
//! untouched.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DocMergeError, Result};
use crate::io::{OutputWriter, PdfReader, SheetReader};
use crate::merge::{MergedArtifact, PdfMerger, SheetMerger};
use crate::model::{Actor, DocumentId, MergeKind, MergeOutcome, NewDocument};
use crate::store::DocumentStore;

/// Minimum number of sources a merge needs.
pub const MIN_SOURCES: usize = 2;

/// Merges stored documents into a new document.
pub struct MergeService<S> {
    store: Arc<S>,
    config: Config,
    output: OutputWriter,
    pdf_reader: PdfReader,
    sheet_reader: SheetReader,
}

impl<S: DocumentStore> MergeService<S> {
    /// Create a merge service over `store`.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            output: OutputWriter::new(&config),
            store,
            config,
            pdf_reader: PdfReader::new(),
            sheet_reader: SheetReader::new(),
        }
    }

    /// Merge the first sheets of the given workbooks.
    pub async fn merge_spreadsheets(
        &self,
        ids: &[DocumentId],
        actor: &Actor,
    ) -> Result<MergeOutcome> {
        self.merge(ids, MergeKind::Spreadsheet, actor).await
    }

    /// Merge the pages of the given PDFs.
    pub async fn merge_pdfs(&self, ids: &[DocumentId], actor: &Actor) -> Result<MergeOutcome> {
        self.merge(ids, MergeKind::Pdf, actor).await
    }

    /// Merge the documents `ids` as `kind` on behalf of `actor`.
    ///
    /// Sources are merged in the order given; a repeated id contributes its
    /// content once per occurrence. Ids that are unknown, not owned by a
    /// non-admin `actor`, of the wrong type, or whose file is missing are
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::InsufficientInputs`] if fewer than two sources
    ///   survive filtering
    /// - [`DocMergeError::MergeFailed`] if a source cannot be decoded
    /// - [`DocMergeError::WriteFailed`] if the output cannot be written
    /// - [`DocMergeError::Storage`] on database failure
    pub async fn merge(
        &self,
        ids: &[DocumentId],
        kind: MergeKind,
        actor: &Actor,
    ) -> Result<MergeOutcome> {
        if ids.len() < MIN_SOURCES {
            return Err(DocMergeError::insufficient_inputs(kind, ids.len()));
        }

        let start = Instant::now();
        let sources = self.resolve_sources(ids, kind, actor).await?;
        if sources.len() < MIN_SOURCES {
            return Err(DocMergeError::insufficient_inputs(kind, sources.len()));
        }

        let artifact = match kind {
            MergeKind::Spreadsheet => self.merge_sheet_sources(&sources).await?,
            MergeKind::Pdf => self.merge_pdf_sources(&sources).await?,
        };
        let items = artifact.item_count();

        let written = self.output.write(artifact).await?;

        let record = NewDocument::merged(kind, written.stored_path.clone(), actor.user_id);
        let id = match self.store.insert_document(record).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    path = %written.disk_path.display(),
                    error = %e,
                    "merged file written but not recorded; left orphaned"
                );
                return Err(e);
            }
        };

        info!(
            id,
            kind = %kind,
            sources = sources.len(),
            items,
            size = written.stats.file_size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            path = %written.stored_path,
            "merge completed"
        );

        Ok(MergeOutcome {
            id,
            path: written.stored_path,
            kind,
            sources: sources.len(),
            items,
        })
    }

    /// Resolve ids to on-disk paths that are authorized, type-matching and
    /// present, preserving request order.
    async fn resolve_sources(
        &self,
        ids: &[DocumentId],
        kind: MergeKind,
        actor: &Actor,
    ) -> Result<Vec<PathBuf>> {
        let lookups = join_all(ids.iter().map(|&id| self.store.find_document(id, actor))).await;

        let mut sources = Vec::with_capacity(ids.len());
        for (&id, lookup) in ids.iter().zip(lookups) {
            let Some(document) = lookup? else {
                let excluded = DocMergeError::Unauthorized { id };
                debug!(id, reason = %excluded, "excluding document");
                continue;
            };

            if !kind.matches_path(&document.file_path) {
                debug!(id, path = %document.file_path, "excluding document of another type");
                continue;
            }

            let path = self.config.resolve(&document.file_path);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                let excluded = DocMergeError::SourceUnreadable { path };
                warn!(id, reason = %excluded, "excluding document");
                continue;
            }

            sources.push(path);
        }

        Ok(sources)
    }

    async fn merge_sheet_sources(&self, paths: &[PathBuf]) -> Result<MergedArtifact> {
        let results = self
            .sheet_reader
            .load_all(paths, self.config.effective_jobs())
            .await;
        let sheets = keep_readable(results, MergeKind::Spreadsheet)?;

        Ok(SheetMerger::new().merge(sheets).into())
    }

    async fn merge_pdf_sources(&self, paths: &[PathBuf]) -> Result<MergedArtifact> {
        let (results, stats) = self
            .pdf_reader
            .load_all(paths, self.config.effective_jobs())
            .await;
        debug!(
            pages = stats.total_pages,
            bytes = stats.total_size,
            elapsed_ms = stats.total_time.as_millis() as u64,
            "loaded PDF sources"
        );
        let pdfs = keep_readable(results, MergeKind::Pdf)?;

        Ok(PdfMerger::new().merge(pdfs)?.into())
    }
}

/// Drop sources that vanished since resolution; abort on any decode error.
fn keep_readable<T>(results: Vec<Result<T>>, kind: MergeKind) -> Result<Vec<T>> {
    let mut loaded = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(item) => loaded.push(item),
            Err(e) if e.is_recoverable() => warn!(reason = %e, "excluding document"),
            Err(e) => return Err(e),
        }
    }

    if loaded.len() < MIN_SOURCES {
        return Err(DocMergeError::insufficient_inputs(kind, loaded.len()));
    }
    Ok(loaded)
}

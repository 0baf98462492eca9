//! Placement of merged artifacts in the upload directory.

use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::error::{DocMergeError, Result};
use crate::io::sheet_writer::SheetWriter;
use crate::io::writer::{PdfWriter, WriteStatistics};
use crate::merge::MergedArtifact;
use crate::utils::unique_file_name;

/// A merged file that has been written to storage.
#[derive(Debug, Clone)]
pub struct WrittenOutput {
    /// Path as stored on the document record, relative to the working root.
    pub stored_path: String,

    /// Resolved on-disk location.
    pub disk_path: PathBuf,

    /// Write statistics.
    pub stats: WriteStatistics,
}

/// Names merged output and writes it under the configured upload directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    config: Config,
    pdf_writer: PdfWriter,
    sheet_writer: SheetWriter,
}

impl OutputWriter {
    /// Create an output writer for `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            pdf_writer: PdfWriter::for_compression(config.compression),
            sheet_writer: SheetWriter::new(),
        }
    }

    /// Write `artifact` under a fresh unique name.
    ///
    /// The upload directory is created if needed.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::WriteFailed`] if the directory or file cannot be
    ///   written
    /// - [`DocMergeError::MergeFailed`] if the artifact cannot be serialized
    pub async fn write(&self, artifact: MergedArtifact) -> Result<WrittenOutput> {
        let upload_root = self.config.upload_root();
        tokio::fs::create_dir_all(&upload_root)
            .await
            .map_err(|e| DocMergeError::write_failed(&upload_root, e))?;

        let extension = artifact.kind().output_extension();
        let (file_name, disk_path) = loop {
            let name = unique_file_name(&self.config.merged_prefix, extension);
            let candidate = upload_root.join(&name);
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                break (name, candidate);
            }
        };

        debug!(path = %disk_path.display(), kind = %artifact.kind(), "writing merged output");

        let stats = match artifact {
            MergedArtifact::Pdf(pdf) => self.pdf_writer.save(pdf.document, &disk_path).await?,
            MergedArtifact::Spreadsheet(sheet) => {
                self.sheet_writer.save(sheet, &disk_path).await?
            }
        };

        Ok(WrittenOutput {
            stored_path: self.config.stored_path(&file_name),
            disk_path,
            stats,
        })
    }
}

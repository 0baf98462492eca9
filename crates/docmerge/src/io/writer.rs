//! PDF writing and saving operations.
//!
//! Merged output is serialized on the blocking pool and written atomically:
//! bytes land in a sibling temp file that is renamed over the final path
//! only once fully flushed. A failed write never leaves a partial file under
//! the final name.
//!
//! # Examples
//!
//! ```no_run
//! use docmerge::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save(doc, Path::new("uploads/merged.pdf")).await?;
//! println!("Wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::CompressionLevel;
use crate::error::{DocMergeError, Result};
use crate::utils::format_file_size;

/// Options for writing output files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Compress PDF streams before writing.
    pub compress: bool,

    /// Drop unreachable PDF objects before writing.
    pub prune: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::from_compression(CompressionLevel::default())
    }
}

impl WriteOptions {
    /// Options matching a configured compression level.
    pub fn from_compression(level: CompressionLevel) -> Self {
        Self {
            atomic: true,
            compress: level != CompressionLevel::None,
            prune: level == CompressionLevel::Maximum,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to serialize and write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer for a configured compression level.
    pub fn for_compression(level: CompressionLevel) -> Self {
        Self::with_options(WriteOptions::from_compression(level))
    }

    /// Serialize `doc` and write it to `path`.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::MergeFailed`] if the document cannot be serialized
    /// - [`DocMergeError::WriteFailed`] if the file cannot be created,
    ///   written or renamed into place
    pub async fn save(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();

            if options.prune {
                doc.prune_objects();
            }
            if options.compress {
                doc.compress();
            }

            let mut bytes = Vec::new();
            doc.save_to(&mut bytes)
                .map_err(|e| DocMergeError::merge_failed(&path_buf, e.to_string()))?;

            let file_size = write_file(&bytes, &path_buf, &options)?;

            Ok(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
                compressed: options.compress,
            })
        })
        .await
        .map_err(|e| DocMergeError::merge_failed(path, format!("Write task failed: {e}")))?
    }
}

/// Write `bytes` to `path`, honoring the atomic option.
///
/// Returns the number of bytes written. On failure the temp file is removed.
pub(crate) fn write_file(bytes: &[u8], path: &Path, options: &WriteOptions) -> Result<u64> {
    let write_path = if options.atomic {
        temp_path(path)
    } else {
        path.to_path_buf()
    };

    let result = write_buffered(bytes, &write_path, options.buffer_size).and_then(|()| {
        if options.atomic {
            std::fs::rename(&write_path, path)
                .map_err(|e| DocMergeError::write_failed(path, e))?;
        }
        Ok(())
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&write_path);
    }
    result.map(|()| bytes.len() as u64)
}

fn write_buffered(bytes: &[u8], path: &Path, buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| DocMergeError::write_failed(path, e))?;
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| DocMergeError::write_failed(path, e))
}

/// `merged_1.pdf` becomes `merged_1.pdf.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

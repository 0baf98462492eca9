//! PDF reading and loading operations.
//!
//! Bytes are read asynchronously and parsed on the blocking pool, so a large
//! source never stalls the runtime. Batches are loaded with bounded
//! concurrency and returned in input order.
//!
//! # Examples
//!
//! ```no_run
//! use docmerge::io::reader::PdfReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("{} pages across {} files", stats.total_pages, stats.success_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{DocMergeError, Result};
use crate::io::load_ordered;

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// Result of a load operation (success or failure).
pub type LoadResult = Result<LoadedPdf>;

/// Statistics for a batch load operation.
#[derive(Debug, Clone, Default)]
pub struct LoadStatistics {
    /// Number of PDFs successfully loaded.
    pub success_count: usize,

    /// Number of PDFs that failed to load.
    pub failure_count: usize,

    /// Total time taken for the batch.
    pub total_time: Duration,

    /// Total size of successfully loaded files.
    pub total_size: u64,

    /// Total number of pages loaded.
    pub total_pages: usize,
}

impl LoadStatistics {
    fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let mut stats = Self {
            total_time,
            ..Default::default()
        };

        for result in results {
            match result {
                Ok(loaded) => {
                    stats.success_count += 1;
                    stats.total_size += loaded.file_size;
                    stats.total_pages += loaded.page_count;
                }
                Err(_) => stats.failure_count += 1,
            }
        }

        stats
    }
}

/// Loads PDF sources from disk.
///
/// A structurally valid document without pages loads normally and simply
/// contributes no pages to a merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::SourceUnreadable`] if the file does not exist
    /// - [`DocMergeError::MergeFailed`] if the bytes are not a valid PDF or
    ///   the PDF is encrypted
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();
        let start = Instant::now();

        let bytes = tokio::fs::read(&path_buf).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DocMergeError::SourceUnreadable {
                path: path_buf.clone(),
            },
            _ => DocMergeError::merge_failed(&path_buf, e.to_string()),
        })?;
        let file_size = bytes.len() as u64;

        let parse_path = path_buf.clone();
        let document = task::spawn_blocking(move || {
            Document::load_mem(&bytes).map_err(|e| {
                let msg = e.to_string();
                if msg.contains("encrypt") || msg.contains("password") {
                    DocMergeError::merge_failed(&parse_path, "PDF is encrypted")
                } else {
                    DocMergeError::merge_failed(&parse_path, msg)
                }
            })
        })
        .await
        .map_err(|e| DocMergeError::merge_failed(&path_buf, format!("Load task failed: {e}")))??;

        let page_count = document.get_pages().len();

        Ok(LoadedPdf {
            document,
            path: path_buf,
            page_count,
            load_time: start.elapsed(),
            file_size,
        })
    }

    /// Load multiple PDFs with at most `workers` loads in flight.
    ///
    /// Returns one result per input path, in input order, plus aggregate
    /// statistics.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();
        let reader = *self;

        let results = load_ordered(paths, workers, move |path| async move {
            reader.load(&path).await
        })
        .await;

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

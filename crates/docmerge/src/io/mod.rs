//! I/O operations for docmerge.
//!
//! This module handles reading source files into memory and writing merged
//! artifacts back to the upload directory:
//! - Loading PDF documents ([`PdfReader`])
//! - Decoding the first sheet of a workbook ([`SheetReader`])
//! - Serializing PDFs and workbooks ([`PdfWriter`], [`SheetWriter`])
//! - Naming and placing merged output ([`OutputWriter`])
//!
//! # Examples
//!
//! ```no_run
//! use docmerge::io::{PdfReader, PdfWriter};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("uploads/a.pdf")).await?;
//!
//! let writer = PdfWriter::new();
//! writer.save(loaded.document, Path::new("uploads/copy.pdf")).await?;
//! # Ok(())
//! # }
//! ```

pub mod output;
pub mod reader;
pub mod sheet_reader;
pub mod sheet_writer;
pub mod writer;

pub use output::{OutputWriter, WrittenOutput};
pub use reader::{LoadedPdf, PdfReader};
pub use sheet_reader::{LoadedSheet, SheetReader};
pub use sheet_writer::SheetWriter;
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;

use crate::error::Result;

/// Run `load` over every path with at most `workers` in flight.
///
/// Results come back in input order regardless of completion order.
pub(crate) async fn load_ordered<T, F, Fut>(
    paths: &[PathBuf],
    workers: usize,
    load: F,
) -> Vec<Result<T>>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let workers = workers.max(1);

    stream::iter(paths.iter().cloned().map(load))
        .buffered(workers)
        .collect::<Vec<_>>()
        .await
}

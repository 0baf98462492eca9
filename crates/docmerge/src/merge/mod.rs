//! Merging of decoded sources into a single artifact.
//!
//! - [`SheetMerger`] concatenates spreadsheet rows
//! - [`PdfMerger`] concatenates PDF pages
//!
//! Mergers are pure: they take already-loaded sources and produce a
//! [`MergedArtifact`] in memory. Naming and writing the result is the job of
//! [`crate::io::OutputWriter`].

pub mod pdf;
pub mod sheet;

pub use pdf::{PdfArtifact, PdfMerger};
pub use sheet::{SheetArtifact, SheetMerger};

use crate::model::MergeKind;

/// The in-memory result of a merge, before it is written.
#[derive(Debug)]
pub enum MergedArtifact {
    /// Concatenated spreadsheet rows.
    Spreadsheet(SheetArtifact),
    /// Concatenated PDF pages.
    Pdf(PdfArtifact),
}

impl MergedArtifact {
    /// Kind of merge that produced this artifact.
    pub fn kind(&self) -> MergeKind {
        match self {
            Self::Spreadsheet(_) => MergeKind::Spreadsheet,
            Self::Pdf(_) => MergeKind::Pdf,
        }
    }

    /// Rows (spreadsheet) or pages (PDF) in the artifact.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Spreadsheet(sheet) => sheet.rows.len(),
            Self::Pdf(pdf) => pdf.page_count,
        }
    }
}

impl From<SheetArtifact> for MergedArtifact {
    fn from(sheet: SheetArtifact) -> Self {
        Self::Spreadsheet(sheet)
    }
}

impl From<PdfArtifact> for MergedArtifact {
    fn from(pdf: PdfArtifact) -> Self {
        Self::Pdf(pdf)
    }
}

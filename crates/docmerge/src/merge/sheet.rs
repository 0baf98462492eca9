//! Spreadsheet row concatenation.

use indexmap::IndexSet;

use crate::io::LoadedSheet;
use crate::model::{CellValue, Row};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Concatenated rows plus the union of all source headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetArtifact {
    /// Every header seen across sources, in first-seen order.
    pub headers: Vec<String>,

    /// All rows, source by source, in input order.
    pub rows: Vec<Row>,
}

impl SheetArtifact {
    /// Value of `header` in `row`, or [`CellValue::Empty`] when the row's
    /// source did not declare that column.
    pub fn cell<'a>(row: &'a Row, header: &str) -> &'a CellValue {
        row.get(header).unwrap_or(&EMPTY_CELL)
    }
}

/// Merges decoded sheets by concatenating their rows.
///
/// Column sets are not reconciled: each row keeps the headers its own source
/// declared. Headers of sources without data rows still join the union.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetMerger;

impl SheetMerger {
    /// Create a new sheet merger.
    pub fn new() -> Self {
        Self
    }

    /// Concatenate `sheets` in order.
    pub fn merge(&self, sheets: Vec<LoadedSheet>) -> SheetArtifact {
        let mut headers: IndexSet<String> = IndexSet::new();
        let mut rows = Vec::with_capacity(sheets.iter().map(|s| s.rows.len()).sum());

        for sheet in sheets {
            headers.extend(sheet.headers);
            for row in sheet.rows {
                // Keys outside the declared headers still get a column.
                headers.extend(row.keys().cloned());
                rows.push(row);
            }
        }

        SheetArtifact {
            headers: headers.into_iter().collect(),
            rows,
        }
    }
}

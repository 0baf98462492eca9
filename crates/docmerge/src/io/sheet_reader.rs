//! Spreadsheet decoding.
//!
//! Only the first worksheet of a workbook is read. Its first row supplies
//! column headers; every following non-blank row becomes a [`Row`] keyed by
//! those headers, with absent cells present as [`CellValue::Empty`].

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{DocMergeError, Result};
use crate::io::load_ordered;
use crate::model::{CellValue, Row};

/// Header given to blank header cells.
const EMPTY_HEADER: &str = "__EMPTY";

/// The decoded first sheet of a workbook.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    /// Path to the source file.
    pub path: PathBuf,

    /// Column headers in sheet order.
    pub headers: Vec<String>,

    /// Data rows, blank rows excluded.
    pub rows: Vec<Row>,

    /// Time taken to decode the workbook.
    pub load_time: Duration,
}

/// Workbook reader for `.xlsx` and `.xls` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetReader;

impl SheetReader {
    /// Create a new sheet reader.
    pub fn new() -> Self {
        Self
    }

    /// Decode the first sheet of the workbook at `path`.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::SourceUnreadable`] if the file does not exist
    /// - [`DocMergeError::MergeFailed`] if the file is not a readable
    ///   workbook or has no sheets
    pub async fn load(&self, path: &Path) -> Result<LoadedSheet> {
        let path_buf = path.to_path_buf();

        if let Err(e) = tokio::fs::metadata(&path_buf).await {
            return Err(match e.kind() {
                io::ErrorKind::NotFound => DocMergeError::SourceUnreadable { path: path_buf },
                _ => DocMergeError::merge_failed(&path_buf, e.to_string()),
            });
        }

        let task_path = path_buf.clone();
        task::spawn_blocking(move || decode_first_sheet(&task_path))
            .await
            .map_err(|e| DocMergeError::merge_failed(&path_buf, format!("Load task failed: {e}")))?
    }

    /// Decode several workbooks with at most `workers` in flight, preserving
    /// input order.
    pub async fn load_all(&self, paths: &[PathBuf], workers: usize) -> Vec<Result<LoadedSheet>> {
        let reader = *self;
        load_ordered(paths, workers, move |path| async move {
            reader.load(&path).await
        })
        .await
    }
}

fn decode_first_sheet(path: &Path) -> Result<LoadedSheet> {
    let start = Instant::now();

    let mut workbook =
        open_workbook_auto(path).map_err(|e| DocMergeError::merge_failed(path, e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DocMergeError::merge_failed(path, "Workbook has no sheets"))?
        .map_err(|e| DocMergeError::merge_failed(path, e.to_string()))?;

    let (headers, rows) = rows_from_range(&range);

    Ok(LoadedSheet {
        path: path.to_path_buf(),
        headers,
        rows,
        load_time: start.elapsed(),
    })
}

fn rows_from_range(range: &Range<Data>) -> (Vec<String>, Vec<Row>) {
    let mut sheet_rows = range.rows();

    let Some(header_cells) = sheet_rows.next() else {
        return (Vec::new(), Vec::new());
    };
    let headers = header_names(header_cells.iter().map(|c| cell_value(c).to_string()));

    let rows = sheet_rows
        .filter_map(|cells| {
            let values: Vec<CellValue> = cells.iter().map(cell_value).collect();
            if values.iter().all(CellValue::is_empty) {
                return None;
            }

            let mut row = Row::with_capacity(headers.len());
            let mut values = values.into_iter();
            for header in &headers {
                row.insert(header.clone(), values.next().unwrap_or(CellValue::Empty));
            }
            Some(row)
        })
        .collect();

    (headers, rows)
}

/// Make header names unique: blanks become `__EMPTY`, repeats gain `_n`.
fn header_names(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used: IndexSet<String> = IndexSet::new();

    for name in raw {
        let base = if name.trim().is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        used.insert(candidate);
    }

    used.into_iter().collect()
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(n) => CellValue::Number(*n),
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                CellValue::Number(dt.as_f64())
            } else {
                dt.as_datetime()
                    .map(CellValue::Date)
                    .unwrap_or_else(|| CellValue::Number(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::text(s.as_str())),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

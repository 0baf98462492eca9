//! Workbook serialization for merged spreadsheets.

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use std::time::Instant;
use tokio::task;

use crate::error::{DocMergeError, Result};
use crate::io::writer::{WriteOptions, WriteStatistics, write_file};
use crate::merge::SheetArtifact;
use crate::model::CellValue;

/// Name of the single worksheet in merged output.
pub const MERGED_SHEET_NAME: &str = "Merged";

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Days from 1899-12-30 to 1900-03-01.
const MARCH_1900: f64 = 61.0;

/// Writes a [`SheetArtifact`] as an `.xlsx` workbook.
#[derive(Debug, Clone, Default)]
pub struct SheetWriter {
    options: WriteOptions,
}

impl SheetWriter {
    /// Create a sheet writer with default (atomic) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Serialize `sheet` and write it to `path`.
    ///
    /// # Errors
    ///
    /// - [`DocMergeError::MergeFailed`] if the workbook cannot be built
    /// - [`DocMergeError::WriteFailed`] if the file cannot be written
    pub async fn save(&self, sheet: SheetArtifact, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();

            let bytes = build_workbook(&sheet)
                .map_err(|e| DocMergeError::merge_failed(&path_buf, e.to_string()))?;
            let file_size = write_file(&bytes, &path_buf, &options)?;

            Ok(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
                compressed: false,
            })
        })
        .await
        .map_err(|e| DocMergeError::merge_failed(path, format!("Write task failed: {e}")))?
    }
}

fn build_workbook(sheet: &SheetArtifact) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(MERGED_SHEET_NAME)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string(0, column(col)?, header)?;
    }

    for (index, row) in sheet.rows.iter().enumerate() {
        let row_num = u32::try_from(index + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, header) in sheet.headers.iter().enumerate() {
            let value = SheetArtifact::cell(row, header);
            write_cell(worksheet, row_num, column(col)?, value, &date_format)?;
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    date_format: &Format,
) -> std::result::Result<(), XlsxError> {
    match value {
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Date(dt) => {
            worksheet.write_number_with_format(row, col, excel_serial(dt), date_format)?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

fn column(index: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Spreadsheet serial number of `dt` in the 1900 date system.
///
/// Serials count days from 1899-12-30 but include a fictitious 1900-02-29,
/// so dates before 1900-03-01 sit one day lower.
fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let days = (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0;
    if days < MARCH_1900 {
        days - 1.0
    } else {
        days
    }
}

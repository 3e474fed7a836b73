//! Raw cell grids from CSV and spreadsheet sources
//!
//! Both readers produce the same shape, a list of rows of [`CellValue`], with
//! no header assumption. Header detection and slicing happen on the grid, so
//! CSV and spreadsheet inputs behave identically.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use crate::app::models::CellValue;
use crate::constants::CSV_EXTENSIONS;
use crate::{Error, Result};

const UTF8_BOM: char = '\u{feff}';

/// Physical format of a transcript export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    /// Choose the reader from the file extension; anything that is not CSV is
    /// handed to the spreadsheet reader, which rejects unknown formats.
    pub fn from_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                CSV_EXTENSIONS
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            });

        if is_csv {
            SourceFormat::Csv
        } else {
            SourceFormat::Spreadsheet
        }
    }
}

/// Read up to `limit` rows (all rows when `None`) from `path`
pub fn read_grid(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<CellValue>>> {
    let grid = match SourceFormat::from_path(path) {
        SourceFormat::Csv => read_csv_grid(path, limit)?,
        SourceFormat::Spreadsheet => read_spreadsheet_grid(path, limit)?,
    };

    debug!(
        "Read {} rows from {} (limit: {:?})",
        grid.len(),
        path.display(),
        limit
    );
    Ok(grid)
}

/// Read a CSV file without assuming a header row.
///
/// Records may have differing field counts (title rows are usually a single
/// cell). A file that is not valid UTF-8 is rejected; decoding it lossily
/// would corrupt accented titles and silently drop their rows.
pub fn read_csv_grid(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<CellValue>>> {
    let file_name = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to open CSV file", Some(e)))?;

    let mut grid = Vec::new();
    for (index, result) in reader.records().enumerate() {
        if limit.is_some_and(|limit| grid.len() >= limit) {
            break;
        }

        let record = result.map_err(|e| {
            let message = match e.kind() {
                csv::ErrorKind::Utf8 { .. } => format!(
                    "Invalid UTF-8 in record {}; re-save the export as UTF-8",
                    index + 1
                ),
                _ => format!("Failed to read record {}", index + 1),
            };
            Error::csv_parsing(&file_name, message, Some(e))
        })?;

        let row = record
            .iter()
            .enumerate()
            .map(|(column, field)| {
                if index == 0 && column == 0 {
                    CellValue::from_text(field.trim_start_matches(UTF8_BOM))
                } else {
                    CellValue::from_text(field)
                }
            })
            .collect();
        grid.push(row);
    }

    Ok(grid)
}

/// Read the first worksheet of a spreadsheet without assuming a header row
pub fn read_spreadsheet_grid(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<CellValue>>> {
    let file_name = path.display().to_string();
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::spreadsheet(&file_name, format!("Failed to open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::spreadsheet(&file_name, "Workbook contains no worksheets"))?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        Error::spreadsheet(
            &file_name,
            format!("Failed to read worksheet '{}': {}", sheet_name, e),
        )
    })?;

    let rows = range.rows().map(|row| row.iter().map(cell_from_spreadsheet).collect());
    let grid = match limit {
        Some(limit) => rows.take(limit).collect(),
        None => rows.collect(),
    };

    Ok(grid)
}

/// Convert a spreadsheet cell.
///
/// Date cells become their serial day count so that the date normalizer
/// applies the spreadsheet epoch to them.
pub fn cell_from_spreadsheet(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::from_text(s),
        Data::DurationIso(s) => CellValue::from_text(s),
        Data::Error(_) => CellValue::Empty,
    }
}

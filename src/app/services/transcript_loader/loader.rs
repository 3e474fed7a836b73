//! Transcript loading orchestration
//!
//! Reads a bounded preview of the file, locates the header row, re-reads the
//! file from that row, and maps the columns onto the canonical schema.

use std::path::Path;

use tracing::{debug, info, warn};

use super::column_mapping::ColumnMapping;
use super::header::detect_header_row;
use super::reader::read_grid;
use crate::Result;
use crate::app::models::{CellValue, TranscriptRow};
use crate::config::ReconcilerConfig;

/// A table whose first row of data immediately follows its header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header cells rendered as text; blank header cells become empty names
    pub headers: Vec<String>,

    /// Data rows below the header, fully blank rows included
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Split a grid at `header_offset`
    pub fn from_grid(mut grid: Vec<Vec<CellValue>>, header_offset: usize) -> Self {
        if header_offset >= grid.len() {
            return Self::default();
        }

        let mut rows = grid.split_off(header_offset);
        let header_row = rows.remove(0);
        let headers = header_row
            .iter()
            .map(|cell| cell.as_text().unwrap_or_default())
            .collect();

        Self { headers, rows }
    }
}

/// Loaded and column-normalized transcript
#[derive(Debug, Clone)]
pub struct LoadedTranscript {
    /// 0-based row offset of the detected header
    pub header_offset: usize,

    /// Column mapping applied to the header
    pub mapping: ColumnMapping,

    /// Typed rows, in source order, blank rows dropped
    pub rows: Vec<TranscriptRow>,
}

/// Tabular loader for transcript exports
#[derive(Debug, Clone)]
pub struct TranscriptLoader {
    preview_rows: usize,
    header_markers: Vec<String>,
}

impl TranscriptLoader {
    pub fn new(config: &ReconcilerConfig) -> Self {
        Self {
            preview_rows: config.header_preview_rows,
            header_markers: config.header_markers.clone(),
        }
    }

    /// Locate the header row of `path` within the preview window.
    ///
    /// Falls back to row 0 when no row in the window carries a header marker.
    pub fn find_header_offset(&self, path: &Path) -> Result<usize> {
        let preview = read_grid(path, Some(self.preview_rows))?;

        match detect_header_row(&preview, &self.header_markers) {
            Some(offset) => {
                debug!("Header row detected at offset {} in {}", offset, path.display());
                Ok(offset)
            }
            None => {
                warn!(
                    "No header marker found in the first {} rows of {}; using row 0 as header",
                    self.preview_rows,
                    path.display()
                );
                Ok(0)
            }
        }
    }

    /// Read `path` into a table whose header is the detected header row
    pub fn load_table(&self, path: &Path) -> Result<(usize, RawTable)> {
        let header_offset = self.find_header_offset(path)?;
        let grid = read_grid(path, None)?;
        Ok((header_offset, RawTable::from_grid(grid, header_offset)))
    }

    /// Load `path` into typed rows, failing if a required column is missing
    pub fn load(&self, path: &Path) -> Result<LoadedTranscript> {
        info!("Loading transcript export: {}", path.display());

        let (header_offset, table) = self.load_table(path)?;
        let mapping = ColumnMapping::analyze(&table.headers);
        debug!(
            "Column mapping: {:?} -> {:?}",
            mapping.original,
            mapping.renamed()
        );
        mapping.require_columns()?;

        let rows: Vec<TranscriptRow> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()))
            .map(|(index, cells)| mapping.build_row(index + 1, cells))
            .collect();

        info!(
            "Loaded {} rows from {} (header at row {})",
            rows.len(),
            path.display(),
            header_offset
        );

        Ok(LoadedTranscript {
            header_offset,
            mapping,
            rows,
        })
    }
}

//! Loader for Transcript Status exports
//!
//! Exports produced by the training platform carry a variable number of title
//! and filter rows above the real column header, and their column names vary
//! with the language the report was run in. This module turns such a file into
//! typed [`TranscriptRow`](crate::app::models::TranscriptRow) records.
//!
//! ## Architecture
//!
//! - [`reader`] - Raw cell grids from CSV and spreadsheet files
//! - [`header`] - Header row detection within the preview window
//! - [`column_mapping`] - Source column names to canonical columns
//! - [`loader`] - Orchestration: preview, detect, re-read, map
//!
//! ## Usage
//!
//! ```rust,no_run
//! use transcript_reconciler::app::services::transcript_loader::TranscriptLoader;
//! use transcript_reconciler::ReconcilerConfig;
//!
//! # fn example() -> transcript_reconciler::Result<()> {
//! let loader = TranscriptLoader::new(&ReconcilerConfig::default());
//! let transcript = loader.load(std::path::Path::new("transcript_status.xlsx"))?;
//!
//! println!("Loaded {} rows (header at offset {})",
//!          transcript.rows.len(),
//!          transcript.header_offset);
//! # Ok(())
//! # }
//! ```

pub mod column_mapping;
pub mod header;
pub mod loader;
pub mod reader;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::{CanonicalColumn, ColumnMapping};
pub use header::detect_header_row;
pub use loader::{LoadedTranscript, RawTable, TranscriptLoader};
pub use reader::SourceFormat;

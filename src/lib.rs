//! Transcript Reconciler Library
//!
//! A Rust library for ingesting "Transcript Status" exports from a corporate
//! learning-management system and reconciling them into a relational store of
//! users, training modules and per-user module progress.
//!
//! This library provides tools for:
//! - Locating the real header row in loosely structured CSV and spreadsheet exports
//! - Mapping bilingual, free-form column names onto a canonical schema
//! - Normalizing status text, heterogeneous dates and module identifiers
//! - Idempotent upsert reconciliation of users, modules and enrollment progress
//! - Run summaries separating row-level issues from run-level failures

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod normalizers;
        pub mod reconciler;
        pub mod transcript_loader;
    }
    pub mod adapters {
        pub mod sqlite;
        pub mod store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

use std::path::Path;

// Re-export commonly used types
pub use app::adapters::sqlite::SqliteStore;
pub use app::adapters::store::TrainingStore;
pub use app::models::{CellValue, EnrollmentProgress, Module, Status, TranscriptRow, User};
pub use app::services::reconciler::{RunSummary, TranscriptProcessor};
pub use config::{ReconcilerConfig, StatusPolicy};

/// Result type alias for the transcript reconciler
pub type Result<T> = std::result::Result<T, Error>;

/// Reconcile one transcript export into `store` using the default configuration.
///
/// See [`TranscriptProcessor::process_file`] for the failure contract.
pub fn process_file<S: TrainingStore>(store: &mut S, path: &Path) -> Result<RunSummary> {
    TranscriptProcessor::new(ReconcilerConfig::default()).process_file(store, path)
}

/// Comprehensive error types for transcript reconciliation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Spreadsheet could not be opened or read
    #[error("Spreadsheet error in file '{file}': {message}")]
    Spreadsheet { file: String, message: String },

    /// Required canonical columns absent after column normalization
    #[error(
        "Missing required columns: {missing:?} (original columns: {original:?}, mapped columns: {mapped:?})"
    )]
    MissingColumns {
        missing: Vec<String>,
        original: Vec<String>,
        mapped: Vec<String>,
    },

    /// A single row could not be reconciled
    #[error("Row {row} ({field}): {message}")]
    RowProcessing {
        row: usize,
        field: String,
        message: String,
    },

    /// Store operation failed
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Store cannot continue serving the run
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Reconciliation aborted and rolled back; carries the partial run summary
    #[error("Reconciliation of '{}' aborted: {source}", .summary.file_name)]
    RunAborted {
        summary: Box<RunSummary>,
        #[source]
        source: Box<Error>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Interrupted by the user before the run committed
    #[error("Interrupted: {message}")]
    Interrupted { message: String },

    /// One or more files of a multi-file import failed
    #[error("{failed} of {total} file(s) could not be reconciled")]
    ImportFailed { failed: usize, total: usize },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a spreadsheet error
    pub fn spreadsheet(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a missing columns error
    pub fn missing_columns(missing: Vec<String>, original: Vec<String>, mapped: Vec<String>) -> Self {
        Self::MissingColumns {
            missing,
            original,
            mapped,
        }
    }

    /// Create a row processing error
    pub fn row_processing(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RowProcessing {
            row,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a store error with context
    pub fn store(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Store {
            message: message.into(),
            source,
        }
    }

    /// Create a store unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Wrap a run-level failure together with the partial summary
    pub fn run_aborted(summary: RunSummary, source: Error) -> Self {
        Self::RunAborted {
            summary: Box::new(summary),
            source: Box::new(source),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an interruption error
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }

    /// Whether the error failed before anything was written
    pub fn is_fatal_load(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::CsvParsing { .. } | Self::Spreadsheet { .. }
        )
    }

    /// Whether a failure raised while reconciling one entity or row may be
    /// recorded on the run summary while the run continues.
    ///
    /// Constraint violations only fail the offending statement, so the open
    /// transaction stays usable. Anything else aborts the run.
    pub fn is_row_recoverable(&self) -> bool {
        match self {
            Self::RowProcessing { .. } => true,
            Self::Store { source, .. } => {
                source.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
            }
            _ => false,
        }
    }

    /// Partial summary carried by an aborted run
    pub fn run_summary(&self) -> Option<&RunSummary> {
        match self {
            Self::RunAborted { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Self::Store {
            message: "SQLite operation failed".to_string(),
            source: error,
        }
    }
}

//! Run report for one reconciliation

use chrono::Local;
use serde::Serialize;

use crate::constants::TIMESTAMP_FORMAT;

/// Outcome of one `process_file` run.
///
/// On an aborted run the counters reflect attempted work, not committed work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Source file name
    pub file_name: String,
    /// Local time the run started
    pub processed_at: String,
    /// Data rows loaded, before filtering
    pub total_rows: usize,
    /// Rows accepted by the filter
    pub filtered_rows: usize,
    /// Distinct user ids among accepted rows
    pub unique_users: usize,
    /// Distinct module titles among accepted rows
    pub unique_modules: usize,
    pub users_created: usize,
    pub modules_created: usize,
    /// Progress records written, inserts and updates alike
    pub progress_updated: usize,
    /// Subset of `progress_updated` that were new records
    pub progress_inserted: usize,
    /// Row-level issues in the order they occurred, plus the abort cause if any
    pub errors: Vec<String>,
}

impl RunSummary {
    /// Create an empty summary stamped with the current time
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            processed_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            total_rows: 0,
            filtered_rows: 0,
            unique_users: 0,
            unique_modules: 0,
            users_created: 0,
            modules_created: 0,
            progress_updated: 0,
            progress_inserted: 0,
            errors: Vec::new(),
        }
    }

    /// Add an error to the summary
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Rows dropped by the filter
    pub fn excluded_rows(&self) -> usize {
        self.total_rows.saturating_sub(self.filtered_rows)
    }

    /// Progress records that overwrote an existing record
    pub fn progress_overwritten(&self) -> usize {
        self.progress_updated.saturating_sub(self.progress_inserted)
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows ({} accepted, {} excluded) | Users: {} seen, {} new | \
             Modules: {} seen, {} new | Progress: {} written ({} new) | Errors: {}",
            self.file_name,
            self.total_rows,
            self.filtered_rows,
            self.excluded_rows(),
            self.unique_users,
            self.users_created,
            self.unique_modules,
            self.modules_created,
            self.progress_updated,
            self.progress_inserted,
            self.errors.len()
        )
    }
}

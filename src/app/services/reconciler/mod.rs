//! Reconciliation engine for transcript exports
//!
//! Turns a loaded transcript into users, modules and enrollment progress in a
//! [`TrainingStore`](crate::app::adapters::store::TrainingStore), as one
//! commit/rollback unit.
//!
//! # Pipeline
//!
//! 1. **Filter**: keep rows whose title yields a module id and, under the
//!    strict policy, whose status is a platform literal
//! 2. **Users**: insert each distinct user id not yet stored
//! 3. **Modules**: insert each distinct module id not yet stored
//! 4. **Progress**: insert or overwrite the (user, module) record for every row
//!
//! Re-running the same file creates no new users or modules and converges
//! progress to the latest values.
//!
//! - [`processor`] - [`TranscriptProcessor`] and pipeline orchestration
//! - [`filter`] - Row acceptance
//! - [`summary`] - [`RunSummary`] run report

pub mod filter;
pub mod processor;
pub mod summary;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use filter::{AcceptedRow, filter_rows};
pub use processor::TranscriptProcessor;
pub use summary::RunSummary;

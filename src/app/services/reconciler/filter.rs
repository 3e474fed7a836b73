//! Row acceptance before reconciliation
//!
//! A row is reconciled only when its title yields a module id. Under the
//! strict policy its status must also be one of the literals the platform
//! emits; under the lenient policy any status is accepted and normalized
//! later.

use std::collections::HashSet;

use tracing::debug;

use crate::app::models::TranscriptRow;
use crate::app::services::normalizers::{ModuleIdExtractor, exact_status};
use crate::config::StatusPolicy;

/// A row that passed the filter, with the module id it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRow {
    pub row: TranscriptRow,
    pub module_id: u32,
}

/// Keep the rows that can be reconciled, in their original order
pub fn filter_rows<E: ModuleIdExtractor + ?Sized>(
    rows: Vec<TranscriptRow>,
    policy: StatusPolicy,
    extractor: &E,
) -> Vec<AcceptedRow> {
    let total = rows.len();
    let accepted: Vec<AcceptedRow> = rows
        .into_iter()
        .filter_map(|row| {
            let module_id = row
                .module_title
                .as_deref()
                .and_then(|title| extractor.extract(title))?;

            let status_ok = match policy {
                StatusPolicy::Strict => row.status.as_deref().and_then(exact_status).is_some(),
                StatusPolicy::Lenient => true,
            };
            status_ok.then_some(AcceptedRow { row, module_id })
        })
        .collect();

    debug!(
        "Filter accepted {} of {} rows ({:?} policy)",
        accepted.len(),
        total,
        policy
    );
    accepted
}

/// Number of distinct non-blank user ids
pub fn count_unique_users(rows: &[AcceptedRow]) -> usize {
    rows.iter()
        .filter_map(|accepted| accepted.row.user_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Number of distinct module titles
pub fn count_unique_titles(rows: &[AcceptedRow]) -> usize {
    rows.iter()
        .filter_map(|accepted| accepted.row.module_title.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

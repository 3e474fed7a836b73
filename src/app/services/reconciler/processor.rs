//! Reconciliation pipeline orchestration
//!
//! Loads a transcript export, filters it, and upserts users, modules and
//! enrollment progress inside a single store run.

use std::collections::HashSet;
use std::path::Path;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::app::adapters::store::TrainingStore;
use crate::app::models::{EnrollmentProgress, Module, TranscriptRow, User};
use crate::app::services::normalizers::{
    ModuleIdExtractor, TitlePatternExtractor, categorize_module, normalize_date, normalize_status,
};
use crate::app::services::transcript_loader::TranscriptLoader;
use crate::config::ReconcilerConfig;
use crate::constants::{DEFAULT_PROVIDER, NOT_AVAILABLE, TIMESTAMP_FORMAT, columns};
use crate::{Error, Result};

use super::filter::{AcceptedRow, count_unique_titles, count_unique_users, filter_rows};
use super::summary::RunSummary;

/// Reconciles transcript exports into a [`TrainingStore`]
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use transcript_reconciler::{ReconcilerConfig, SqliteStore, TranscriptProcessor};
///
/// # fn example() -> transcript_reconciler::Result<()> {
/// let mut store = SqliteStore::open(Path::new("training.db"))?;
/// let processor = TranscriptProcessor::new(ReconcilerConfig::default());
///
/// let summary = processor.process_file(&mut store, Path::new("Transcript Status.xlsx"))?;
/// println!("{}", summary.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TranscriptProcessor<E = TitlePatternExtractor> {
    config: ReconcilerConfig,
    loader: TranscriptLoader,
    extractor: E,
}

impl TranscriptProcessor<TitlePatternExtractor> {
    /// Create a processor extracting module ids from title text
    pub fn new(config: ReconcilerConfig) -> Self {
        Self::with_extractor(config, TitlePatternExtractor)
    }
}

impl<E: ModuleIdExtractor> TranscriptProcessor<E> {
    /// Create a processor with a custom module id scheme
    pub fn with_extractor(config: ReconcilerConfig, extractor: E) -> Self {
        let loader = TranscriptLoader::new(&config);
        Self {
            config,
            loader,
            extractor,
        }
    }

    /// Get the configuration used by this processor
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reconcile one transcript export into `store`.
    ///
    /// Load failures and missing required columns are returned before anything
    /// is written. Once the run is open, row-level problems are recorded on the
    /// summary and processing continues; any other failure rolls the run back
    /// and returns [`Error::RunAborted`] carrying the partial summary.
    pub fn process_file<S: TrainingStore + ?Sized>(
        &self,
        store: &mut S,
        path: &Path,
    ) -> Result<RunSummary> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Reconciling transcript {}", path.display());
        let transcript = self.loader.load(path)?;

        let mut summary = RunSummary::new(file_name);
        summary.total_rows = transcript.rows.len();

        // Step 1: keep rows with a module id (and a platform status when strict)
        let accepted = filter_rows(transcript.rows, self.config.status_policy, &self.extractor);
        summary.filtered_rows = accepted.len();
        summary.unique_users = count_unique_users(&accepted);
        summary.unique_modules = count_unique_titles(&accepted);

        if let Err(e) = store.begin_run() {
            error!("Could not open a run for {}: {}", summary.file_name, e);
            summary.add_error(e.to_string());
            return Err(Error::run_aborted(summary, e));
        }

        // Steps 2-4 share the run; the first unrecoverable error aborts it
        let outcome = self
            .reconcile(store, &accepted, &mut summary)
            .and_then(|()| store.commit_run());

        match outcome {
            Ok(()) => {
                info!("{}", summary.summary());
                if summary.has_errors() {
                    warn!(
                        "{} row-level issues while reconciling {}",
                        summary.errors.len(),
                        summary.file_name
                    );
                }
                Ok(summary)
            }
            Err(e) => {
                error!("Reconciliation of {} aborted: {}", summary.file_name, e);
                if let Err(rollback_error) = store.rollback_run() {
                    error!("Rollback failed: {}", rollback_error);
                    summary.add_error(rollback_error.to_string());
                }
                summary.add_error(e.to_string());
                Err(Error::run_aborted(summary, e))
            }
        }
    }

    fn reconcile<S: TrainingStore + ?Sized>(
        &self,
        store: &mut S,
        accepted: &[AcceptedRow],
        summary: &mut RunSummary,
    ) -> Result<()> {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();

        // Step 2: users, create-once
        let mut seen_users = HashSet::new();
        for accepted_row in accepted {
            let row = &accepted_row.row;
            let Some(user_id) = row.user_id.as_deref() else {
                continue;
            };
            if !seen_users.insert(user_id) {
                continue;
            }

            match self.upsert_user(store, user_id, row) {
                Ok(true) => summary.users_created += 1,
                Ok(false) => {}
                Err(e) if e.is_row_recoverable() => {
                    summary.add_error(format!("User '{}': {}", user_id, e))
                }
                Err(e) => return Err(e),
            }
        }

        // Step 3: modules, create-once per id
        let mut seen_titles = HashSet::new();
        for accepted_row in accepted {
            let Some(title) = accepted_row.row.module_title.as_deref() else {
                continue;
            };
            if !seen_titles.insert(title) {
                continue;
            }

            match self.ensure_module(store, accepted_row, &now) {
                Ok(true) => summary.modules_created += 1,
                Ok(false) => {}
                Err(e) if e.is_row_recoverable() => {
                    summary.add_error(format!("Module '{}': {}", title, e))
                }
                Err(e) => return Err(e),
            }
        }

        // Step 4: progress, in row order
        for accepted_row in accepted {
            match self.upsert_progress(store, accepted_row, &now, summary) {
                Ok(()) => {}
                Err(e) if e.is_row_recoverable() => {
                    let message = match &e {
                        Error::RowProcessing { .. } => e.to_string(),
                        _ => format!("Row {}: {}", accepted_row.row.row_number, e),
                    };
                    debug!("{}", message);
                    summary.add_error(message);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Insert the user unless it exists; returns whether it was created
    fn upsert_user<S: TrainingStore + ?Sized>(
        &self,
        store: &mut S,
        user_id: &str,
        row: &TranscriptRow,
    ) -> Result<bool> {
        if store.find_user(user_id)?.is_some() {
            return Ok(false);
        }

        let user = User::with_default_email(
            user_id,
            row.user_name.clone(),
            &self.config.email_domain,
            &self.config.email_type,
        );
        store.insert_user(&user)?;
        debug!("Created user {}", user_id);
        Ok(true)
    }

    /// Insert the row's module unless its id exists; returns whether it was created
    fn ensure_module<S: TrainingStore + ?Sized>(
        &self,
        store: &mut S,
        accepted_row: &AcceptedRow,
        now: &str,
    ) -> Result<bool> {
        if store.find_module(accepted_row.module_id)?.is_some() {
            return Ok(false);
        }

        let module = build_module(accepted_row, now);
        store.insert_module(&module)?;
        debug!("Created module {} ({})", module.module_id, module.name);
        Ok(true)
    }

    fn upsert_progress<S: TrainingStore + ?Sized>(
        &self,
        store: &mut S,
        accepted_row: &AcceptedRow,
        now: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let row = &accepted_row.row;
        let user_id = row.user_id.as_deref().ok_or_else(|| {
            Error::row_processing(row.row_number, columns::USER_ID, "user id is blank")
        })?;

        // Normally created in step 3
        if self.ensure_module(store, accepted_row, now)? {
            warn!(
                "Module {} was missing at row {}; created it",
                accepted_row.module_id, row.row_number
            );
            summary.modules_created += 1;
        }

        let progress = EnrollmentProgress {
            user_id: user_id.to_string(),
            module_id: accepted_row.module_id,
            status: normalize_status(row.status.as_deref()),
            started_on: normalize_date(&row.start_date),
            completed_on: normalize_date(&row.end_date),
            updated_at: now.to_string(),
        };

        if store.find_progress(user_id, accepted_row.module_id)?.is_some() {
            store.update_progress(&progress)?;
        } else {
            store.insert_progress(&progress)?;
            summary.progress_inserted += 1;
        }
        summary.progress_updated += 1;
        Ok(())
    }
}

/// Module record for a title, described from the row's type and provider
fn build_module(accepted_row: &AcceptedRow, now: &str) -> Module {
    let row = &accepted_row.row;
    let name = row.module_title.clone().unwrap_or_default();
    let category = categorize_module(&name);
    let description = format!(
        "Tipo: {}\nProveedor: {}\nCategoría: {}",
        row.training_type.as_deref().unwrap_or(NOT_AVAILABLE),
        row.provider.as_deref().unwrap_or(DEFAULT_PROVIDER),
        category
    );

    Module {
        module_id: accepted_row.module_id,
        name,
        description: Some(description),
        category: Some(category.to_string()),
        assigned_at: now.to_string(),
    }
}

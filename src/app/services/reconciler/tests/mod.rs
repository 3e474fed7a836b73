//! Tests for the reconciliation engine
//!
//! Runs go against an in-memory SQLite store. [`FailingStore`] wraps it to
//! inject store failures at a chosen progress write.

pub mod filter_tests;

use tempfile::NamedTempFile;

use crate::app::adapters::sqlite::SqliteStore;
use crate::app::adapters::store::TrainingStore;
use crate::app::models::{EnrollmentProgress, Module, User};
use crate::app::services::transcript_loader::tests::{
    ENGLISH_HEADER, create_temp_csv, transcript_csv,
};
use crate::{Error, Result};

/// Write an English-header export with two noise rows above the header
pub fn transcript_fixture(rows: &[&str]) -> NamedTempFile {
    create_temp_csv(&transcript_csv(2, ENGLISH_HEADER, rows))
}

/// Row count of `table`
pub fn count_rows(store: &SqliteStore, table: &str) -> i64 {
    store
        .conn_ref()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

/// Kind of failure injected by [`FailingStore`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    /// The store stops serving the run
    Unavailable,
    /// One statement violates a constraint; the run stays usable
    Constraint,
}

/// Store wrapper failing the n-th progress write (1-based)
pub struct FailingStore {
    pub inner: SqliteStore,
    pub fail_on_write: usize,
    pub fault: Fault,
    progress_writes: usize,
}

impl FailingStore {
    pub fn new(fail_on_write: usize, fault: Fault) -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            fail_on_write,
            fault,
            progress_writes: 0,
        }
    }

    fn check_progress_write(&mut self) -> Result<()> {
        self.progress_writes += 1;
        if self.progress_writes != self.fail_on_write {
            return Ok(());
        }
        Err(match self.fault {
            Fault::Unavailable => Error::store_unavailable("injected failure"),
            Fault::Constraint => Error::store(
                "injected constraint violation",
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
                    Some("injected".to_string()),
                ),
            ),
        })
    }
}

impl TrainingStore for FailingStore {
    fn begin_run(&mut self) -> Result<()> {
        self.inner.begin_run()
    }

    fn commit_run(&mut self) -> Result<()> {
        self.inner.commit_run()
    }

    fn rollback_run(&mut self) -> Result<()> {
        self.inner.rollback_run()
    }

    fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        self.inner.find_user(user_id)
    }

    fn insert_user(&mut self, user: &User) -> Result<()> {
        self.inner.insert_user(user)
    }

    fn find_module(&self, module_id: u32) -> Result<Option<Module>> {
        self.inner.find_module(module_id)
    }

    fn insert_module(&mut self, module: &Module) -> Result<()> {
        self.inner.insert_module(module)
    }

    fn find_progress(&self, user_id: &str, module_id: u32) -> Result<Option<EnrollmentProgress>> {
        self.inner.find_progress(user_id, module_id)
    }

    fn insert_progress(&mut self, progress: &EnrollmentProgress) -> Result<()> {
        self.check_progress_write()?;
        self.inner.insert_progress(progress)
    }

    fn update_progress(&mut self, progress: &EnrollmentProgress) -> Result<()> {
        self.check_progress_write()?;
        self.inner.update_progress(progress)
    }
}

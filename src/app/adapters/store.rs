//! Store collaborator used by the reconciler
//!
//! Point lookups by natural key, inserts, one update and a commit/rollback
//! pair scoped to a whole reconciliation run. Everything written between
//! [`TrainingStore::begin_run`] and [`TrainingStore::commit_run`] must be
//! discarded by [`TrainingStore::rollback_run`].

use crate::Result;
use crate::app::models::{EnrollmentProgress, Module, User};

pub trait TrainingStore {
    /// Open the run's transaction
    fn begin_run(&mut self) -> Result<()>;

    /// Make every write since [`begin_run`](Self::begin_run) durable
    fn commit_run(&mut self) -> Result<()>;

    /// Discard every write since [`begin_run`](Self::begin_run)
    fn rollback_run(&mut self) -> Result<()>;

    fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    fn insert_user(&mut self, user: &User) -> Result<()>;

    fn find_module(&self, module_id: u32) -> Result<Option<Module>>;

    fn insert_module(&mut self, module: &Module) -> Result<()>;

    fn find_progress(&self, user_id: &str, module_id: u32) -> Result<Option<EnrollmentProgress>>;

    fn insert_progress(&mut self, progress: &EnrollmentProgress) -> Result<()>;

    /// Overwrite status, dates and update timestamp of an existing (user, module) record
    fn update_progress(&mut self, progress: &EnrollmentProgress) -> Result<()>;
}

//! SQLite-backed training store
//!
//! [`SqliteStore`] implements [`TrainingStore`] over a single `rusqlite`
//! connection. A reconciliation run is one `BEGIN IMMEDIATE` transaction;
//! dropping the store with a run still open discards its writes.
//!
//! The read-only reporting queries used by the command line live in
//! [`reports`].

pub mod reports;
pub mod schema;

pub use reports::{
    BusinessUnitReport, BusinessUnitUsers, CompletionTrendPoint, DatabaseSummary,
    ModuleProgressEntry, ModuleStats, NewUserEntry, UserProgressEntry,
};

use std::path::Path;

use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::app::adapters::store::TrainingStore;
use crate::app::models::{BusinessUnit, EnrollmentProgress, Module, Status, User};
use crate::constants::TIMESTAMP_FORMAT;
use crate::{Error, Result};

pub struct SqliteStore {
    conn: Connection,
    run_open: bool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::io(format!("Failed to create directory {}", parent.display()), e)
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::store(format!("Failed to open {}", path.display()), e))?;
        debug!("Opened database at {}", path.display());
        Self::with_connection(conn)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store("Failed to open in-memory database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        schema::apply_schema(&conn)?;
        Ok(Self {
            conn,
            run_open: false,
        })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Whether a run transaction is currently open
    pub fn is_run_open(&self) -> bool {
        self.run_open
    }

    /// Register a business unit; existing names are reused
    pub fn ensure_business_unit(&self, name: &str) -> Result<BusinessUnit> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO business_units (name) VALUES (?1)",
                params![name],
            )
            .map_err(|e| Error::store(format!("Failed to insert business unit '{name}'"), e))?;
        self.conn
            .query_row(
                "SELECT id, name FROM business_units WHERE name = ?1",
                params![name],
                |row| {
                    Ok(BusinessUnit {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .map_err(|e| Error::store(format!("Failed to read business unit '{name}'"), e))
    }

    fn map_user_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            user_id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            email_type: row.get(3)?,
            business_unit_id: row.get(4)?,
            level: row.get(5)?,
            division: row.get(6)?,
            active: row.get(7)?,
        })
    }

    fn map_module_row(row: &Row) -> rusqlite::Result<Module> {
        Ok(Module {
            module_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            assigned_at: row.get(4)?,
        })
    }

    // The CHECK constraint keeps stored statuses within the canonical literals
    fn map_progress_row(row: &Row) -> rusqlite::Result<EnrollmentProgress> {
        let status: String = row.get(2)?;
        Ok(EnrollmentProgress {
            user_id: row.get(0)?,
            module_id: row.get(1)?,
            status: Status::from_stored(&status).unwrap_or_default(),
            started_on: row.get(3)?,
            completed_on: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TrainingStore for SqliteStore {
    fn begin_run(&mut self) -> Result<()> {
        if self.run_open {
            return Err(Error::store_unavailable("A run is already open"));
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| Error::store("Failed to begin transaction", e))?;
        self.run_open = true;
        Ok(())
    }

    fn commit_run(&mut self) -> Result<()> {
        if !self.run_open {
            return Err(Error::store_unavailable("No run is open"));
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| Error::store("Failed to commit transaction", e))?;
        self.run_open = false;
        Ok(())
    }

    fn rollback_run(&mut self) -> Result<()> {
        if !self.run_open {
            return Ok(());
        }
        self.run_open = false;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| Error::store("Failed to roll back transaction", e))
    }

    fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT user_id, name, email, email_type, business_unit_id, level, division, active
                 FROM users WHERE user_id = ?1",
                params![user_id],
                Self::map_user_row,
            )
            .optional()
            .map_err(|e| Error::store(format!("Failed to look up user '{user_id}'"), e))
    }

    fn insert_user(&mut self, user: &User) -> Result<()> {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.conn
            .execute(
                "INSERT INTO users (user_id, name, email, email_type, business_unit_id,
                                    level, division, active, registered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.user_id,
                    user.name,
                    user.email,
                    user.email_type,
                    user.business_unit_id,
                    user.level,
                    user.division,
                    user.active,
                    now,
                ],
            )
            .map_err(|e| Error::store(format!("Failed to insert user '{}'", user.user_id), e))?;
        Ok(())
    }

    fn find_module(&self, module_id: u32) -> Result<Option<Module>> {
        self.conn
            .query_row(
                "SELECT module_id, name, description, category, assigned_at
                 FROM modules WHERE module_id = ?1",
                params![module_id],
                Self::map_module_row,
            )
            .optional()
            .map_err(|e| Error::store(format!("Failed to look up module {module_id}"), e))
    }

    fn insert_module(&mut self, module: &Module) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO modules (module_id, name, description, category, assigned_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    module.module_id,
                    module.name,
                    module.description,
                    module.category,
                    module.assigned_at,
                ],
            )
            .map_err(|e| {
                Error::store(format!("Failed to insert module {}", module.module_id), e)
            })?;
        Ok(())
    }

    fn find_progress(&self, user_id: &str, module_id: u32) -> Result<Option<EnrollmentProgress>> {
        self.conn
            .query_row(
                "SELECT user_id, module_id, status, started_on, completed_on, updated_at
                 FROM module_progress WHERE user_id = ?1 AND module_id = ?2",
                params![user_id, module_id],
                Self::map_progress_row,
            )
            .optional()
            .map_err(|e| {
                Error::store(
                    format!("Failed to look up progress for '{user_id}' on module {module_id}"),
                    e,
                )
            })
    }

    fn insert_progress(&mut self, progress: &EnrollmentProgress) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO module_progress
                     (user_id, module_id, status, started_on, completed_on, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    progress.user_id,
                    progress.module_id,
                    progress.status.as_str(),
                    progress.started_on,
                    progress.completed_on,
                    progress.updated_at,
                ],
            )
            .map_err(|e| {
                Error::store(
                    format!(
                        "Failed to insert progress for '{}' on module {}",
                        progress.user_id, progress.module_id
                    ),
                    e,
                )
            })?;
        Ok(())
    }

    fn update_progress(&mut self, progress: &EnrollmentProgress) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE module_progress
                 SET status = ?3, started_on = ?4, completed_on = ?5, updated_at = ?6
                 WHERE user_id = ?1 AND module_id = ?2",
                params![
                    progress.user_id,
                    progress.module_id,
                    progress.status.as_str(),
                    progress.started_on,
                    progress.completed_on,
                    progress.updated_at,
                ],
            )
            .map_err(|e| {
                Error::store(
                    format!(
                        "Failed to update progress for '{}' on module {}",
                        progress.user_id, progress.module_id
                    ),
                    e,
                )
            })?;

        if changed == 0 {
            return Err(Error::store_unavailable(format!(
                "No progress record for '{}' on module {}",
                progress.user_id, progress.module_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User::with_default_email(id, Some(format!("Name {id}")), "hutchison.mx", "Corporativo")
    }

    fn module(id: u32) -> Module {
        Module {
            module_id: id,
            name: format!("MÓDULO 1.{id}"),
            description: Some("Tipo: N/A".to_string()),
            category: Some("General".to_string()),
            assigned_at: "2024-05-01 09:00:00".to_string(),
        }
    }

    fn progress(user_id: &str, module_id: u32, status: Status) -> EnrollmentProgress {
        EnrollmentProgress {
            user_id: user_id.to_string(),
            module_id,
            status,
            started_on: Some("2024-03-15".to_string()),
            completed_on: None,
            updated_at: "2024-05-01 09:00:00".to_string(),
        }
    }

    #[test]
    fn test_user_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.find_user("U001").unwrap(), None);

        store.insert_user(&user("U001")).unwrap();
        let found = store.find_user("U001").unwrap().unwrap();
        assert_eq!(found, user("U001"));
    }

    #[test]
    fn test_duplicate_user_is_constraint_violation() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_user(&user("U001")).unwrap();

        let err = store.insert_user(&user("U001")).unwrap_err();
        assert!(err.is_row_recoverable());
    }

    #[test]
    fn test_module_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_module(&module(3)).unwrap();

        assert_eq!(store.find_module(3).unwrap(), Some(module(3)));
        assert_eq!(store.find_module(4).unwrap(), None);
    }

    #[test]
    fn test_progress_insert_and_update() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_user(&user("U001")).unwrap();
        store.insert_module(&module(1)).unwrap();

        store
            .insert_progress(&progress("U001", 1, Status::InProgress))
            .unwrap();

        let mut updated = progress("U001", 1, Status::Completed);
        updated.completed_on = Some("2024-03-20".to_string());
        store.update_progress(&updated).unwrap();

        assert_eq!(store.find_progress("U001", 1).unwrap(), Some(updated));
        assert_eq!(store.find_progress("U001", 2).unwrap(), None);
    }

    #[test]
    fn test_update_of_missing_progress_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .update_progress(&progress("U001", 1, Status::Completed))
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .insert_progress(&progress("ghost", 1, Status::Registered))
            .unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn test_rollback_discards_run_writes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.begin_run().unwrap();
        store.insert_user(&user("U001")).unwrap();
        store.insert_module(&module(1)).unwrap();
        store.rollback_run().unwrap();

        assert!(!store.is_run_open());
        assert_eq!(store.find_user("U001").unwrap(), None);
        assert_eq!(store.find_module(1).unwrap(), None);
    }

    #[test]
    fn test_commit_persists_run_writes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.begin_run().unwrap();
        store.insert_user(&user("U001")).unwrap();
        store.commit_run().unwrap();

        assert!(store.find_user("U001").unwrap().is_some());
    }

    #[test]
    fn test_run_boundaries_are_checked() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.commit_run().is_err());
        // Rolling back with nothing open is a no-op
        store.rollback_run().unwrap();

        store.begin_run().unwrap();
        assert!(store.begin_run().is_err());
    }

    #[test]
    fn test_open_on_disk_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("training.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.insert_user(&user("U001")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.find_user("U001").unwrap().is_some());
    }

    #[test]
    fn test_dropping_open_run_discards_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.begin_run().unwrap();
            store.insert_user(&user("U001")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.find_user("U001").unwrap(), None);
    }

    #[test]
    fn test_business_units_are_reused_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.ensure_business_unit("Operaciones").unwrap();
        let second = store.ensure_business_unit("Operaciones").unwrap();
        let other = store.ensure_business_unit("Comercial").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "Operaciones");
        assert_ne!(first.id, other.id);
    }
}

//! Read-only reporting queries over the training store

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use serde::Serialize;

use super::SqliteStore;
use crate::app::models::Status;
use crate::constants::ISO_DATE_FORMAT;
use crate::{Error, Result};

/// Database-wide totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSummary {
    pub total_users: i64,
    pub total_modules: i64,
    pub total_progress: i64,
    /// Progress records per status, every status listed
    pub progress_by_status: Vec<(Status, i64)>,
    /// Users per business unit, units without users included
    pub users_by_business_unit: Vec<BusinessUnitUsers>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessUnitUsers {
    pub name: String,
    pub users: i64,
}

/// Completion figures for one module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleStats {
    pub module_id: u32,
    pub name: String,
    pub users: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub registered: i64,
    pub average_score: Option<f64>,
}

impl ModuleStats {
    /// Completed share of enrolled users, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            (self.completed as f64 / self.users as f64) * 100.0
        }
    }
}

/// One module on a user's record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProgressEntry {
    pub module_id: u32,
    pub module_name: String,
    pub status: Status,
    pub score: Option<f64>,
    pub started_on: Option<String>,
    pub completed_on: Option<String>,
}

/// Completions recorded on one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionTrendPoint {
    pub date: String,
    pub completed: i64,
    pub users: i64,
}

/// User registered in the store on or after a date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserEntry {
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub business_unit: Option<String>,
    pub division: Option<String>,
    pub registered_at: Option<String>,
    pub active: bool,
}

/// Training figures for one business unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessUnitReport {
    pub name: String,
    pub users: i64,
    /// Distinct active modules the unit's users are enrolled in
    pub active_modules: i64,
    pub completed: i64,
    pub average_score: Option<f64>,
}

/// One enrollment, with the learner's name, for per-status listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgressEntry {
    pub module_id: u32,
    pub module_name: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub status: Status,
    pub score: Option<f64>,
    pub started_on: Option<String>,
    pub completed_on: Option<String>,
}

impl SqliteStore {
    fn count(&self, sql: &str) -> Result<i64> {
        self.conn_ref()
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::store("Failed to run count query", e))
    }

    /// Totals, per-status counts and per-business-unit user counts
    pub fn database_summary(&self) -> Result<DatabaseSummary> {
        let total_users = self.count("SELECT COUNT(*) FROM users")?;
        let total_modules = self.count("SELECT COUNT(*) FROM modules")?;
        let total_progress = self.count("SELECT COUNT(*) FROM module_progress")?;

        let mut progress_by_status = Vec::with_capacity(Status::ALL.len());
        for status in Status::ALL {
            let count: i64 = self
                .conn_ref()
                .query_row(
                    "SELECT COUNT(*) FROM module_progress WHERE status = ?1",
                    params![status.as_str()],
                    |row| row.get(0),
                )
                .map_err(|e| Error::store(format!("Failed to count '{status}' progress"), e))?;
            progress_by_status.push((status, count));
        }

        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT bu.name, COUNT(u.user_id)
                 FROM business_units bu
                 LEFT JOIN users u ON u.business_unit_id = bu.id
                 GROUP BY bu.id, bu.name
                 ORDER BY COUNT(u.user_id) DESC, bu.name",
            )
            .map_err(|e| Error::store("Failed to prepare business unit query", e))?;
        let users_by_business_unit = stmt
            .query_map([], |row| {
                Ok(BusinessUnitUsers {
                    name: row.get(0)?,
                    users: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::store("Failed to read business unit counts", e))?;

        Ok(DatabaseSummary {
            total_users,
            total_modules,
            total_progress,
            progress_by_status,
            users_by_business_unit,
        })
    }

    /// Per-module statistics, most enrolled first
    pub fn module_stats(&self) -> Result<Vec<ModuleStats>> {
        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT m.module_id, m.name,
                        COUNT(DISTINCT mp.user_id),
                        COALESCE(SUM(CASE WHEN mp.status = ?1 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN mp.status = ?2 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN mp.status = ?3 THEN 1 ELSE 0 END), 0),
                        AVG(mp.score)
                 FROM modules m
                 LEFT JOIN module_progress mp ON mp.module_id = m.module_id
                 WHERE m.active = 1
                 GROUP BY m.module_id, m.name
                 ORDER BY COUNT(DISTINCT mp.user_id) DESC, m.module_id",
            )
            .map_err(|e| Error::store("Failed to prepare module statistics query", e))?;

        let rows = stmt.query_map(
            params![
                Status::Completed.as_str(),
                Status::InProgress.as_str(),
                Status::Registered.as_str()
            ],
            |row| {
                Ok(ModuleStats {
                    module_id: row.get(0)?,
                    name: row.get(1)?,
                    users: row.get(2)?,
                    completed: row.get(3)?,
                    in_progress: row.get(4)?,
                    registered: row.get(5)?,
                    average_score: row.get(6)?,
                })
            },
        )
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| Error::store("Failed to read module statistics", e))?;
        Ok(rows)
    }

    /// Every module on one user's record, newest start first
    pub fn user_progress(&self, user_id: &str) -> Result<Vec<UserProgressEntry>> {
        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT m.module_id, m.name, mp.status, mp.score, mp.started_on, mp.completed_on
                 FROM module_progress mp
                 JOIN modules m ON m.module_id = mp.module_id
                 WHERE mp.user_id = ?1
                 ORDER BY mp.started_on DESC, m.module_id",
            )
            .map_err(|e| Error::store("Failed to prepare user progress query", e))?;

        let rows = stmt.query_map(params![user_id], |row| {
            let status: String = row.get(2)?;
            Ok(UserProgressEntry {
                module_id: row.get(0)?,
                module_name: row.get(1)?,
                status: Status::from_stored(&status).unwrap_or_default(),
                score: row.get(3)?,
                started_on: row.get(4)?,
                completed_on: row.get(5)?,
            })
        })
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| Error::store(format!("Failed to read progress for '{user_id}'"), e))?;
        Ok(rows)
    }

    /// Completions per completion date on or after `since`
    pub fn completion_trend(&self, since: NaiveDate) -> Result<Vec<CompletionTrendPoint>> {
        let since = since.format(ISO_DATE_FORMAT).to_string();
        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT completed_on, COUNT(*), COUNT(DISTINCT user_id)
                 FROM module_progress
                 WHERE status = ?1 AND completed_on IS NOT NULL AND completed_on >= ?2
                 GROUP BY completed_on
                 ORDER BY completed_on",
            )
            .map_err(|e| Error::store("Failed to prepare completion trend query", e))?;

        let rows = stmt.query_map(params![Status::Completed.as_str(), since], |row| {
            Ok(CompletionTrendPoint {
                date: row.get(0)?,
                completed: row.get(1)?,
                users: row.get(2)?,
            })
        })
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| Error::store("Failed to read completion trend", e))?;
        Ok(rows)
    }

    /// Users registered on or after `since`, newest first
    pub fn new_users(&self, since: NaiveDate) -> Result<Vec<NewUserEntry>> {
        let since = since.format(ISO_DATE_FORMAT).to_string();
        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT u.user_id, u.name, u.email, bu.name, u.division, u.registered_at, u.active
                 FROM users u
                 LEFT JOIN business_units bu ON bu.id = u.business_unit_id
                 WHERE u.registered_at >= ?1
                 ORDER BY u.registered_at DESC, u.user_id",
            )
            .map_err(|e| Error::store("Failed to prepare new users query", e))?;

        let rows = stmt
            .query_map(params![since], |row| {
                Ok(NewUserEntry {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    business_unit: row.get(3)?,
                    division: row.get(4)?,
                    registered_at: row.get(5)?,
                    active: row.get(6)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::store("Failed to read new users", e))?;
        Ok(rows)
    }

    /// Per business unit: users, enrolled active modules, completions and
    /// average score. Units without users are listed with zeros.
    pub fn business_unit_report(&self) -> Result<Vec<BusinessUnitReport>> {
        let mut stmt = self
            .conn_ref()
            .prepare(
                "SELECT bu.name,
                        COUNT(DISTINCT u.user_id),
                        COUNT(DISTINCT CASE WHEN m.active = 1 THEN mp.module_id END),
                        COUNT(CASE WHEN mp.status = ?1 THEN 1 END),
                        AVG(mp.score)
                 FROM business_units bu
                 LEFT JOIN users u ON u.business_unit_id = bu.id
                 LEFT JOIN module_progress mp ON mp.user_id = u.user_id
                 LEFT JOIN modules m ON m.module_id = mp.module_id
                 GROUP BY bu.id, bu.name
                 ORDER BY COUNT(DISTINCT u.user_id) DESC, bu.name",
            )
            .map_err(|e| Error::store("Failed to prepare business unit report", e))?;

        let rows = stmt
            .query_map(params![Status::Completed.as_str()], |row| {
                Ok(BusinessUnitReport {
                    name: row.get(0)?,
                    users: row.get(1)?,
                    active_modules: row.get(2)?,
                    completed: row.get(3)?,
                    average_score: row.get(4)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::store("Failed to read business unit report", e))?;
        Ok(rows)
    }

    /// Enrollments in any of `statuses`, optionally for one module, ordered by
    /// module name then learner. An empty status list means every status.
    pub fn module_progress_by_status(
        &self,
        module_id: Option<u32>,
        statuses: &[Status],
    ) -> Result<Vec<ModuleProgressEntry>> {
        let statuses = if statuses.is_empty() {
            &Status::ALL[..]
        } else {
            statuses
        };

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let mut sql = format!(
            "SELECT m.module_id, m.name, u.user_id, u.name, mp.status, mp.score,
                    mp.started_on, mp.completed_on
             FROM module_progress mp
             JOIN modules m ON m.module_id = mp.module_id
             JOIN users u ON u.user_id = mp.user_id
             WHERE mp.status IN ({placeholders})"
        );

        let mut values: Vec<Value> = statuses
            .iter()
            .map(|status| Value::Text(status.as_str().to_string()))
            .collect();
        if let Some(module_id) = module_id {
            sql.push_str(" AND mp.module_id = ?");
            values.push(Value::Integer(i64::from(module_id)));
        }
        sql.push_str(" ORDER BY m.name, u.name, u.user_id");

        let mut stmt = self
            .conn_ref()
            .prepare(&sql)
            .map_err(|e| Error::store("Failed to prepare progress by status query", e))?;

        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let status: String = row.get(4)?;
                Ok(ModuleProgressEntry {
                    module_id: row.get(0)?,
                    module_name: row.get(1)?,
                    user_id: row.get(2)?,
                    user_name: row.get(3)?,
                    status: Status::from_stored(&status).unwrap_or_default(),
                    score: row.get(5)?,
                    started_on: row.get(6)?,
                    completed_on: row.get(7)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::store("Failed to read progress by status", e))?;
        Ok(rows)
    }
}

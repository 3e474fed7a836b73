//! Database schema bootstrap
//!
//! Tables are created idempotently on open; there are no migrations.

use rusqlite::Connection;

use crate::{Error, Result};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS business_units (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    name             TEXT,
    email            TEXT NOT NULL,
    email_type       TEXT,
    business_unit_id INTEGER REFERENCES business_units(id),
    level            TEXT,
    division         TEXT,
    active           INTEGER NOT NULL DEFAULT 1,
    registered_at    TEXT
);

CREATE TABLE IF NOT EXISTS modules (
    module_id   INTEGER PRIMARY KEY CHECK (module_id > 0),
    name        TEXT NOT NULL,
    description TEXT,
    category    TEXT,
    assigned_at TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS module_progress (
    id           INTEGER PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    module_id    INTEGER NOT NULL REFERENCES modules(module_id),
    status       TEXT NOT NULL
                 CHECK (status IN ('Completado', 'En proceso', 'Registrado', 'No iniciado')),
    started_on   TEXT,
    completed_on TEXT,
    score        REAL,
    updated_at   TEXT NOT NULL,
    UNIQUE (user_id, module_id)
);

CREATE INDEX IF NOT EXISTS idx_module_progress_module ON module_progress(module_id);
CREATE INDEX IF NOT EXISTS idx_module_progress_status ON module_progress(status);
";

/// Enable foreign keys and create any missing table
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| Error::store("Failed to enable foreign keys", e))?;
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| Error::store("Failed to create schema", e))
}

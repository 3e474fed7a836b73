//! Application constants for the transcript reconciler
//!
//! This module contains the fixed vocabulary of the Transcript Status export
//! format, default values, and the literals persisted in the store.

// =============================================================================
// Source File Layout
// =============================================================================

/// Number of leading rows scanned when looking for the real header row
pub const HEADER_PREVIEW_ROWS: usize = 20;

/// Cell text that identifies the header row (case-sensitive substrings)
pub const HEADER_MARKERS: &[&str] = &["Nombre completo", "User Name", "Usuario"];

/// File extensions read with the CSV reader; everything else goes to the spreadsheet reader
pub const CSV_EXTENSIONS: &[&str] = &["csv"];

// =============================================================================
// Canonical Column Names
// =============================================================================

pub mod columns {
    pub const USER_ID: &str = "id_usuario";
    pub const USER_NAME: &str = "nombre_usuario";
    pub const MODULE_TITLE: &str = "titulo_modulo";
    pub const VERSION: &str = "version";
    pub const TRAINING_TYPE: &str = "tipo";
    pub const PROVIDER: &str = "proveedor";
    pub const STATUS: &str = "estado";
    pub const START_DATE: &str = "fecha_inicio";
    pub const END_DATE: &str = "fecha_fin";
}

// =============================================================================
// Status Vocabulary
// =============================================================================

/// Canonical status literals as stored in the progress table
pub mod status_literals {
    pub const COMPLETED: &str = "Completado";
    pub const IN_PROGRESS: &str = "En proceso";
    pub const REGISTERED: &str = "Registrado";
    pub const NOT_STARTED: &str = "No iniciado";

    /// All canonical values, in reporting order
    pub const ALL: &[&str] = &[COMPLETED, IN_PROGRESS, REGISTERED, NOT_STARTED];
}

// =============================================================================
// Dates
// =============================================================================

/// Spreadsheet serial date epoch (day 0)
pub const SPREADSHEET_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Date formats tried, in order, against the date portion of a text value
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Output format for normalized dates
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Output format for run and update timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Entity Defaults
// =============================================================================

/// Domain used to build a user's email when the export carries none
pub const DEFAULT_EMAIL_DOMAIN: &str = "hutchison.mx";

/// Email-type tag stored on users created by the pipeline
pub const DEFAULT_EMAIL_TYPE: &str = "Corporativo";

/// Provider shown in module descriptions when the export leaves it blank
pub const DEFAULT_PROVIDER: &str = "Instituto HP";

/// Placeholder for blank descriptive fields
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Configuration
// =============================================================================

/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "TRANSCRIPT_RECONCILER_DATABASE";

/// Application directory name under the platform data/config directories
pub const APP_DIR_NAME: &str = "transcript-reconciler";

/// Default database file name
pub const DATABASE_FILE_NAME: &str = "training.db";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

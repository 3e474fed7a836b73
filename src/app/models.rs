//! Data models for transcript reconciliation
//!
//! This module contains the typed row record produced by the loader and the
//! four persistent entities the reconciler writes: business units, users,
//! modules and enrollment progress.

use crate::constants::status_literals;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cell Values
// =============================================================================

/// A single cell as read from a CSV or spreadsheet source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    /// Blank cell
    #[default]
    Empty,
    /// Free text (every CSV cell is text)
    Text(String),
    /// Numeric cell; spreadsheet dates arrive as serial day counts
    Number(f64),
    /// Boolean cell
    Bool(bool),
}

impl CellValue {
    /// Build a cell from raw text, treating whitespace-only text as empty
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the cell as text, `None` when blank.
    ///
    /// Integral numbers render without a fractional part so that numeric
    /// user identifiers survive spreadsheet round-trips.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }

    /// Whether the cell text contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.as_text().is_some_and(|text| text.contains(needle))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "{}", text),
            None => Ok(()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Status Vocabulary
// =============================================================================

/// Closed vocabulary of module progress states
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Status {
    Completed,
    InProgress,
    Registered,
    #[default]
    NotStarted,
}

impl Status {
    /// All statuses in reporting order
    pub const ALL: [Status; 4] = [
        Status::Completed,
        Status::InProgress,
        Status::Registered,
        Status::NotStarted,
    ];

    /// Literal persisted in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Completed => status_literals::COMPLETED,
            Status::InProgress => status_literals::IN_PROGRESS,
            Status::Registered => status_literals::REGISTERED,
            Status::NotStarted => status_literals::NOT_STARTED,
        }
    }

    /// Parse a stored literal back into a status
    pub fn from_stored(value: &str) -> Option<Self> {
        Status::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Source Rows
// =============================================================================

/// One data row of a transcript export, keyed by canonical columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptRow {
    /// 1-based position in the data section, for diagnostics
    pub row_number: usize,

    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub module_title: Option<String>,

    /// Raw status text, normalized later
    pub status: Option<String>,

    /// Raw start date; may be a spreadsheet serial or text
    pub start_date: CellValue,

    /// Raw completion date; may be a spreadsheet serial or text
    pub end_date: CellValue,

    pub version: Option<String>,
    pub training_type: Option<String>,
    pub provider: Option<String>,
}

// =============================================================================
// Persistent Entities
// =============================================================================

/// Organisational unit a user may belong to; created outside the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: i64,
    pub name: String,
}

/// Learner, keyed by the platform's user identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub email_type: Option<String>,
    pub business_unit_id: Option<i64>,
    pub level: Option<String>,
    pub division: Option<String>,
    pub active: bool,
}

impl User {
    /// New active user with an email derived from the identifier
    pub fn with_default_email(
        user_id: impl Into<String>,
        name: Option<String>,
        email_domain: &str,
        email_type: &str,
    ) -> Self {
        let user_id = user_id.into();
        let email = format!("{}@{}", user_id, email_domain);
        Self {
            user_id,
            name,
            email,
            email_type: Some(email_type.to_string()),
            business_unit_id: None,
            level: None,
            division: None,
            active: true,
        }
    }
}

/// Training module, keyed by the number extracted from its title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub module_id: u32,
    /// Full original title
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Formatted with [`crate::constants::TIMESTAMP_FORMAT`]
    pub assigned_at: String,
}

/// Association of one user with one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentProgress {
    pub user_id: String,
    pub module_id: u32,
    pub status: Status,
    /// ISO date, or the source text when it could not be parsed
    pub started_on: Option<String>,
    /// ISO date, or the source text when it could not be parsed
    pub completed_on: Option<String>,
    pub updated_at: String,
}

//! Column mapping from free-form export headers to canonical columns
//!
//! The same report is exported with Spanish or English headers, and with
//! small wording changes between platform releases. Each source column is
//! lower-cased, trimmed and tested against ordered rules; the first canonical
//! column whose rule matches wins.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::app::models::{CellValue, TranscriptRow};
use crate::constants::columns;
use crate::{Error, Result};

/// Canonical columns consumed downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalColumn {
    UserId,
    UserName,
    ModuleTitle,
    Version,
    TrainingType,
    Provider,
    Status,
    StartDate,
    EndDate,
}

impl CanonicalColumn {
    /// Columns without which a file cannot be reconciled
    pub const REQUIRED: [CanonicalColumn; 3] = [
        CanonicalColumn::UserId,
        CanonicalColumn::ModuleTitle,
        CanonicalColumn::Status,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalColumn::UserId => columns::USER_ID,
            CanonicalColumn::UserName => columns::USER_NAME,
            CanonicalColumn::ModuleTitle => columns::MODULE_TITLE,
            CanonicalColumn::Version => columns::VERSION,
            CanonicalColumn::TrainingType => columns::TRAINING_TYPE,
            CanonicalColumn::Provider => columns::PROVIDER,
            CanonicalColumn::Status => columns::STATUS,
            CanonicalColumn::StartDate => columns::START_DATE,
            CanonicalColumn::EndDate => columns::END_DATE,
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matching rule for one canonical column.
///
/// A normalized name matches when it contains every token of any one entry in
/// `contains_all`, or equals one of `exact`.
struct ColumnRule {
    column: CanonicalColumn,
    contains_all: &'static [&'static [&'static str]],
    exact: &'static [&'static str],
}

impl ColumnRule {
    fn matches(&self, name: &str) -> bool {
        self.exact.contains(&name)
            || self
                .contains_all
                .iter()
                .any(|tokens| tokens.iter().all(|token| name.contains(token)))
    }
}

/// Rules in priority order
const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        column: CanonicalColumn::UserId,
        contains_all: &[
            &["identificación", "usuario"],
            &["identificacion", "usuario"],
            &["identification", "user"],
        ],
        exact: &["user id", "userid", "user_id", "id usuario", columns::USER_ID],
    },
    ColumnRule {
        column: CanonicalColumn::UserName,
        contains_all: &[&["nombre", "usuario"], &["nombre completo"], &["full name"]],
        exact: &["user name", "username", "nombre", columns::USER_NAME],
    },
    ColumnRule {
        column: CanonicalColumn::ModuleTitle,
        contains_all: &[
            &["título", "capacitación"],
            &["titulo", "capacitacion"],
            &["título", "curso"],
            &["titulo", "curso"],
            &["training title"],
            &["course title"],
        ],
        exact: &["title", "título", "titulo", columns::MODULE_TITLE],
    },
    ColumnRule {
        column: CanonicalColumn::Version,
        contains_all: &[&["versión"], &["version"]],
        exact: &[],
    },
    ColumnRule {
        column: CanonicalColumn::TrainingType,
        contains_all: &[
            &["tipo de capacitación"],
            &["tipo de capacitacion"],
            &["training type"],
        ],
        exact: &["type", columns::TRAINING_TYPE],
    },
    ColumnRule {
        column: CanonicalColumn::Provider,
        contains_all: &[&["proveedor"], &["training provider"]],
        exact: &["provider"],
    },
    ColumnRule {
        column: CanonicalColumn::Status,
        contains_all: &[&["estado"], &["estatus"], &["transcript status"]],
        exact: &["status"],
    },
    ColumnRule {
        column: CanonicalColumn::StartDate,
        contains_all: &[&["fecha de inicio"], &["start date"]],
        exact: &[columns::START_DATE],
    },
    ColumnRule {
        column: CanonicalColumn::EndDate,
        contains_all: &[
            &["fecha de finalización"],
            &["fecha de finalizacion"],
            &["completed date"],
            &["completion date"],
        ],
        exact: &[columns::END_DATE],
    },
];

/// Map one source column name to its canonical column
pub fn canonical_column(source_name: &str) -> Option<CanonicalColumn> {
    let name = source_name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    COLUMN_RULES
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.column)
}

/// Column mapping for one loaded table
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Source column names as they appear in the file
    pub original: Vec<String>,

    /// Canonical column for each source position, if any
    pub canonical: Vec<Option<CanonicalColumn>>,

    /// Canonical column to source index
    index: HashMap<CanonicalColumn, usize>,
}

impl ColumnMapping {
    /// Analyze header names.
    ///
    /// When two source columns map to the same canonical column the first one
    /// is used and the later one is left unmapped.
    pub fn analyze<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut index = HashMap::new();
        let mut canonical = Vec::with_capacity(headers.len());

        for (position, header) in headers.iter().enumerate() {
            let mapped = canonical_column(header.as_ref()).filter(|column| {
                if index.contains_key(column) {
                    debug!(
                        "Column '{}' also maps to {}; keeping the first occurrence",
                        header.as_ref(),
                        column
                    );
                    false
                } else {
                    true
                }
            });

            if let Some(column) = mapped {
                index.insert(column, position);
            }
            canonical.push(mapped);
        }

        Self {
            original: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            canonical,
            index,
        }
    }

    /// Get the source index for a canonical column
    pub fn get_index(&self, column: CanonicalColumn) -> Option<usize> {
        self.index.get(&column).copied()
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.index.contains_key(&column)
    }

    /// Column names after renaming; unmapped columns keep their source name
    pub fn renamed(&self) -> Vec<String> {
        self.original
            .iter()
            .zip(&self.canonical)
            .map(|(original, canonical)| match canonical {
                Some(column) => column.name().to_string(),
                None => original.clone(),
            })
            .collect()
    }

    /// Required canonical columns that no source column maps to
    pub fn missing_required(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::REQUIRED
            .into_iter()
            .filter(|column| !self.has_column(*column))
            .collect()
    }

    /// Fail with [`Error::MissingColumns`] unless every required column is mapped
    pub fn require_columns(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::missing_columns(
            missing.iter().map(|c| c.name().to_string()).collect(),
            self.original.clone(),
            self.renamed(),
        ))
    }

    /// Build a typed row from one data row of the source table
    pub fn build_row(&self, row_number: usize, cells: &[CellValue]) -> TranscriptRow {
        let cell = |column: CanonicalColumn| -> CellValue {
            self.get_index(column)
                .and_then(|index| cells.get(index))
                .cloned()
                .unwrap_or_default()
        };
        let text = |column: CanonicalColumn| cell(column).as_text();

        TranscriptRow {
            row_number,
            user_id: text(CanonicalColumn::UserId),
            user_name: text(CanonicalColumn::UserName),
            module_title: text(CanonicalColumn::ModuleTitle),
            status: text(CanonicalColumn::Status),
            start_date: cell(CanonicalColumn::StartDate),
            end_date: cell(CanonicalColumn::EndDate),
            version: text(CanonicalColumn::Version),
            training_type: text(CanonicalColumn::TrainingType),
            provider: text(CanonicalColumn::Provider),
        }
    }
}

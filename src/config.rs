//! Configuration management and validation.
//!
//! Provides the reconciler configuration: where the store lives, how new
//! users are defaulted, how the header row is detected, and which rows the
//! reconciliation accepts. Configuration is layered: defaults, an optional
//! TOML file, the environment, then command-line overrides.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DATABASE_ENV_VAR, DATABASE_FILE_NAME, DEFAULT_EMAIL_DOMAIN,
    DEFAULT_EMAIL_TYPE, HEADER_MARKERS, HEADER_PREVIEW_ROWS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which rows the reconciliation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Only rows whose status is one of the literals the platform emits
    #[default]
    Strict,
    /// Any row with a module id; unknown statuses default to not started
    Lenient,
}

/// Global configuration for transcript reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Domain appended to the user id when building a default email
    pub email_domain: String,

    /// Email-type tag stored on users created by the pipeline
    pub email_type: String,

    /// Leading rows scanned for the header row
    pub header_preview_rows: usize,

    /// Case-sensitive substrings identifying the header row
    pub header_markers: Vec<String>,

    /// Row acceptance policy
    pub status_policy: StatusPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            database_path: Self::default_database_path(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            email_type: DEFAULT_EMAIL_TYPE.to_string(),
            header_preview_rows: HEADER_PREVIEW_ROWS,
            header_markers: HEADER_MARKERS.iter().map(|m| m.to_string()).collect(),
            status_policy: StatusPolicy::Strict,
        }
    }
}

impl ReconcilerConfig {
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = domain.into();
        self
    }

    pub fn with_header_preview_rows(mut self, rows: usize) -> Self {
        self.header_preview_rows = rows;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    /// Default database location: `<data dir>/transcript-reconciler/training.db`
    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join(DATABASE_FILE_NAME)
    }

    /// Default configuration file location
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))?;
        Ok(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read a TOML configuration file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "Invalid config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Build configuration from defaults, an optional file, then the environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(database) = std::env::var(DATABASE_ENV_VAR) {
            if !database.trim().is_empty() {
                debug!("Database path overridden by {}", DATABASE_ENV_VAR);
                config.database_path = PathBuf::from(database);
            }
        }

        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.header_preview_rows == 0 {
            return Err(Error::configuration(
                "header_preview_rows must be at least 1",
            ));
        }

        if self.header_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::configuration(
                "at least one non-empty header marker is required",
            ));
        }

        let domain = self.email_domain.trim();
        if domain.is_empty() || domain.contains('@') || domain.contains(char::is_whitespace) {
            return Err(Error::configuration(format!(
                "invalid email domain '{}'",
                self.email_domain
            )));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(Error::configuration("database_path must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReconcilerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.header_preview_rows, 20);
        assert_eq!(config.email_domain, "hutchison.mx");
        assert_eq!(config.status_policy, StatusPolicy::Strict);
        assert_eq!(config.header_markers.len(), 3);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ReconcilerConfig::default().with_header_preview_rows(0);
        assert!(config.validate().is_err());

        let config = ReconcilerConfig::default().with_email_domain("user@example.com");
        assert!(config.validate().is_err());

        let config = ReconcilerConfig::default().with_email_domain("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "email_domain = \"example.org\"").unwrap();
        writeln!(file, "status_policy = \"lenient\"").unwrap();

        let config = ReconcilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.email_domain, "example.org");
        assert_eq!(config.status_policy, StatusPolicy::Lenient);
        assert_eq!(config.header_preview_rows, 20);
        assert_eq!(config.email_type, "Corporativo");
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "header_preview_rows = \"many\"").unwrap();

        let err = ReconcilerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}

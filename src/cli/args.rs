//! Command-line argument definitions for the transcript reconciler
//!
//! This module defines the CLI interface using the clap derive API. Global
//! flags (database, config file, verbosity, output format) are accepted
//! before or after the subcommand.

use crate::app::models::Status;
use crate::{Error, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the transcript reconciler
///
/// Reconciles "Transcript Status" exports from the learning platform into a
/// local SQLite database of users, training modules and module progress.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "transcript-reconciler",
    version,
    about = "Reconcile LMS Transcript Status exports into a training progress database",
    long_about = "Loads Transcript Status exports (CSV or Excel) from the learning platform, \
                  locates the real header row, maps Spanish or English column names onto a \
                  canonical schema and upserts users, modules and per-user module progress \
                  into a SQLite database. Each file is reconciled as one transaction."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// SQLite database file
    ///
    /// Overrides the config file and the TRANSCRIPT_RECONCILER_DATABASE
    /// environment variable.
    #[arg(
        short = 'd',
        long = "database",
        value_name = "FILE",
        global = true,
        help = "Path to the SQLite database"
    )]
    pub database: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/transcript-reconciler/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings and hides the spinner.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        global = true,
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Reconcile one or more transcript exports into the database
    Import(ImportArgs),
    /// Show database totals and the completion trend
    Stats(StatsArgs),
    /// Show per-module completion statistics
    Modules,
    /// Show one user's module progress
    User(UserArgs),
    /// List users registered recently
    NewUsers(NewUsersArgs),
    /// Show the per-business-unit report, optionally registering a unit first
    Units(UnitsArgs),
    /// List enrollments filtered by status and module
    Progress(ProgressArgs),
    /// Create the database schema
    Init,
}

/// Arguments for the import command
#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// Transcript exports to reconcile (.csv, .xlsx, .xls)
    ///
    /// Each file is reconciled as its own run; a failing file does not stop
    /// the remaining ones.
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Accept rows with any status, normalizing unknown values
    ///
    /// By default only rows whose status is one of the values the platform
    /// emits are reconciled.
    #[arg(long = "lenient", help = "Accept rows with any status value")]
    pub lenient: bool,

    /// Email domain for newly created users
    #[arg(
        long = "email-domain",
        value_name = "DOMAIN",
        help = "Email domain for newly created users"
    )]
    pub email_domain: Option<String>,

    /// Leading rows scanned for the header row
    #[arg(
        long = "header-rows",
        value_name = "COUNT",
        help = "Number of leading rows scanned for the header row"
    )]
    pub header_rows: Option<usize>,
}

/// Arguments for the stats command
#[derive(Debug, Clone, Parser)]
pub struct StatsArgs {
    /// Include daily completions on or after this date
    #[arg(
        long = "since",
        value_name = "YYYY-MM-DD",
        help = "Show the completion trend since this date"
    )]
    pub since: Option<NaiveDate>,
}

/// Arguments for the user command
#[derive(Debug, Clone, Parser)]
pub struct UserArgs {
    /// Platform user identifier
    #[arg(value_name = "USER_ID")]
    pub user_id: String,
}

/// Arguments for the new-users command
#[derive(Debug, Clone, Parser)]
pub struct NewUsersArgs {
    /// Look back this many days from today
    #[arg(
        long = "days",
        value_name = "DAYS",
        default_value_t = 30,
        conflicts_with = "since",
        help = "Users registered in the last DAYS days"
    )]
    pub days: u32,

    /// Users registered on or after this date
    #[arg(long = "since", value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,
}

impl NewUsersArgs {
    /// First registration date included, relative to `today`
    pub fn since_date(&self, today: NaiveDate) -> NaiveDate {
        self.since.unwrap_or_else(|| {
            today
                .checked_sub_signed(chrono::Duration::days(i64::from(self.days)))
                .unwrap_or(NaiveDate::MIN)
        })
    }
}

/// Arguments for the units command
#[derive(Debug, Clone, Parser)]
pub struct UnitsArgs {
    /// Register a business unit by name before reporting
    ///
    /// Users are associated with units outside the import; existing names
    /// are left as they are.
    #[arg(long = "add", value_name = "NAME")]
    pub add: Option<String>,
}

/// Arguments for the progress command
#[derive(Debug, Clone, Parser)]
pub struct ProgressArgs {
    /// Restrict to one module id
    #[arg(long = "module", value_name = "ID")]
    pub module: Option<u32>,

    /// Statuses to include (repeatable); all statuses when omitted
    #[arg(long = "status", value_enum, value_name = "STATUS")]
    pub statuses: Vec<StatusArg>,
}

/// Progress status as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Completed,
    InProgress,
    Registered,
    NotStarted,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Completed => Status::Completed,
            StatusArg::InProgress => Status::InProgress,
            StatusArg::Registered => Status::Registered,
            StatusArg::NotStarted => Status::NotStarted,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show the spinner (human output, not quiet)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }

    /// Validate global arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        match &self.command {
            Some(Commands::Import(import)) => import.validate()?,
            Some(Commands::Units(UnitsArgs { add: Some(name) })) if name.trim().is_empty() => {
                return Err(Error::configuration("Business unit name must not be blank"));
            }
            _ => {}
        }

        Ok(())
    }
}

impl ImportArgs {
    /// Validate the import command arguments
    pub fn validate(&self) -> Result<()> {
        for file in &self.files {
            if !file.is_file() {
                return Err(Error::configuration(format!(
                    "Input file does not exist: {}",
                    file.display()
                )));
            }
        }

        if self.header_rows == Some(0) {
            return Err(Error::configuration(
                "Header rows must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

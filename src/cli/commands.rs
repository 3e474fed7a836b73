//! Command implementations for the transcript reconciler CLI
//!
//! This module contains command execution, progress reporting and result
//! rendering for the CLI interface.

use crate::app::adapters::sqlite::{
    BusinessUnitReport, CompletionTrendPoint, DatabaseSummary, ModuleProgressEntry, ModuleStats,
    NewUserEntry, SqliteStore, UserProgressEntry,
};
use crate::app::adapters::store::TrainingStore;
use crate::app::models::{Status, User};
use crate::app::services::reconciler::{RunSummary, TranscriptProcessor};
use crate::cli::args::{
    Args, Commands, ImportArgs, NewUsersArgs, OutputFormat, ProgressArgs, StatsArgs, UnitsArgs,
};
use crate::config::{ReconcilerConfig, StatusPolicy};
use crate::{Error, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of reconciling one file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    /// Present on success and on aborted runs
    pub summary: Option<RunSummary>,
    /// Failure text when the file was not reconciled
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Main command runner
///
/// Sets up logging and configuration, then dispatches to the subcommand.
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    info!("Starting transcript reconciler");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    match &args.command {
        Some(Commands::Import(import)) => run_import(&args, import, config).await,
        Some(Commands::Stats(stats)) => run_stats(&args, stats, &config),
        Some(Commands::Modules) => run_modules(&args, &config),
        Some(Commands::User(user)) => run_user(&args, &user.user_id, &config),
        Some(Commands::NewUsers(new_users)) => run_new_users(&args, new_users, &config),
        Some(Commands::Units(units)) => run_units(&args, units, &config),
        Some(Commands::Progress(progress)) => run_progress(&args, progress, &config),
        Some(Commands::Init) => run_init(&args, &config),
        None => Err(Error::configuration("No command given")),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("transcript_reconciler={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
fn load_configuration(args: &Args) -> Result<ReconcilerConfig> {
    let default_config_path = if args.config_file.is_none() {
        ReconcilerConfig::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    if let Some(config_path) = config_file {
        info!("Using config file: {}", config_path.display());
    } else {
        debug!("No config file found, using defaults and environment variables");
    }

    let mut config = ReconcilerConfig::load_layered(config_file)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut ReconcilerConfig, args: &Args) {
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }

    if let Some(Commands::Import(import)) = &args.command {
        if import.lenient {
            config.status_policy = StatusPolicy::Lenient;
        }
        if let Some(domain) = &import.email_domain {
            config.email_domain = domain.clone();
        }
        if let Some(rows) = import.header_rows {
            config.header_preview_rows = rows;
        }
    }
}

fn open_store(config: &ReconcilerConfig) -> Result<SqliteStore> {
    debug!("Opening database {}", config.database_path.display());
    SqliteStore::open(&config.database_path)
}

/// Reconcile every file on a blocking worker while watching for Ctrl-C
async fn run_import(args: &Args, import: &ImportArgs, config: ReconcilerConfig) -> Result<()> {
    let start_time = Instant::now();
    let files = import.files.clone();
    info!("Importing {} file(s) into {}", files.len(), config.database_path.display());

    let spinner = if args.show_progress() {
        Some(create_spinner(files.len()))
    } else {
        None
    };

    let worker_spinner = spinner.clone();
    let worker =
        tokio::task::spawn_blocking(move || import_files(&config, &files, worker_spinner.as_ref()));

    let outcomes = tokio::select! {
        joined = worker => joined
            .map_err(|e| Error::store_unavailable(format!("Import worker failed: {}", e)))??,
        _ = tokio::signal::ctrl_c() => {
            if let Some(pb) = &spinner {
                pb.abandon_with_message("Interrupted");
            }
            warn!("Import interrupted; the open run was not committed");
            return Err(Error::interrupted(
                "Import interrupted by user; the file in progress was not committed",
            ));
        }
    };

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    match args.output_format {
        OutputFormat::Human => print_import_report(&outcomes, start_time.elapsed()),
        OutputFormat::Json => print_json(&outcomes)?,
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    if failed > 0 {
        return Err(Error::ImportFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

/// Reconcile each file as its own run, continuing past failed files
pub fn import_files(
    config: &ReconcilerConfig,
    files: &[PathBuf],
    progress: Option<&ProgressBar>,
) -> Result<Vec<FileOutcome>> {
    let mut store = open_store(config)?;
    let processor = TranscriptProcessor::new(config.clone());

    let mut outcomes = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        if let Some(pb) = progress {
            pb.set_message(format!(
                "[{}/{}] Reconciling {}",
                i + 1,
                files.len(),
                display_name(file)
            ));
        }

        let outcome = match processor.process_file(&mut store, file) {
            Ok(summary) => FileOutcome {
                file: file.clone(),
                summary: Some(summary),
                error: None,
            },
            Err(e) => {
                error!("Failed to reconcile {}: {}", file.display(), e);
                FileOutcome {
                    file: file.clone(),
                    summary: e.run_summary().cloned(),
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn create_spinner(file_count: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Reconciling {} file(s)...", file_count));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_stats(args: &Args, stats_args: &StatsArgs, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    let summary = store.database_summary()?;
    let trend = match stats_args.since {
        Some(since) => Some(store.completion_trend(since)?),
        None => None,
    };

    match args.output_format {
        OutputFormat::Human => {
            print_database_summary(&summary);
            if let Some(trend) = &trend {
                print_completion_trend(trend);
            }
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "summary": summary,
            "completion_trend": trend,
        })),
    }
}

fn run_modules(args: &Args, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.module_stats()?;

    match args.output_format {
        OutputFormat::Human => {
            print_module_stats(&stats);
            Ok(())
        }
        OutputFormat::Json => print_json(&stats),
    }
}

fn run_user(args: &Args, user_id: &str, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    let user = store.find_user(user_id)?;
    let progress = store.user_progress(user_id)?;

    match args.output_format {
        OutputFormat::Human => {
            print_user_progress(user_id, user.as_ref(), &progress);
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "user": user,
            "progress": progress,
        })),
    }
}

fn run_new_users(args: &Args, new_users: &NewUsersArgs, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    let since = new_users.since_date(chrono::Local::now().date_naive());
    let users = store.new_users(since)?;

    match args.output_format {
        OutputFormat::Human => {
            print_new_users(since, &users);
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "since": since,
            "users": users,
        })),
    }
}

fn run_units(args: &Args, units: &UnitsArgs, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    if let Some(name) = &units.add {
        let unit = store.ensure_business_unit(name.trim())?;
        info!("Business unit '{}' has id {}", unit.name, unit.id);
    }
    let report = store.business_unit_report()?;

    match args.output_format {
        OutputFormat::Human => {
            print_business_units(&report);
            Ok(())
        }
        OutputFormat::Json => print_json(&report),
    }
}

fn run_progress(args: &Args, progress: &ProgressArgs, config: &ReconcilerConfig) -> Result<()> {
    let store = open_store(config)?;
    let statuses: Vec<Status> = progress.statuses.iter().copied().map(Status::from).collect();
    let entries = store.module_progress_by_status(progress.module, &statuses)?;

    match args.output_format {
        OutputFormat::Human => {
            print_progress_entries(&entries);
            Ok(())
        }
        OutputFormat::Json => print_json(&entries),
    }
}

fn run_init(args: &Args, config: &ReconcilerConfig) -> Result<()> {
    open_store(config)?;
    info!("Schema ready at {}", config.database_path.display());

    match args.output_format {
        OutputFormat::Human => {
            if !args.quiet {
                println!(
                    "{} {}",
                    "Database ready:".bright_green().bold(),
                    config.database_path.display()
                );
            }
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "database": config.database_path,
        })),
    }
}

/// Print a value as pretty JSON on stdout
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| Error::io("Failed to serialize output", e.into()))?;
    println!("{}", rendered);
    Ok(())
}

/// Generate human-readable import report
fn print_import_report(outcomes: &[FileOutcome], elapsed: Duration) {
    println!("\n{}", "Import Summary".bright_green().bold());

    for outcome in outcomes {
        let name = display_name(&outcome.file);
        match (&outcome.summary, &outcome.error) {
            (Some(summary), None) => {
                println!("  {} {}", "✓".bright_green(), name.bright_white().bold());
                print_run_summary(summary);
            }
            (summary, Some(error)) => {
                println!("  {} {}", "✗".bright_red(), name.bright_white().bold());
                println!("    {} {}", "Error:".bright_red(), error);
                if let Some(summary) = summary {
                    println!("    {}", "Rolled back; attempted work:".bright_yellow());
                    print_run_summary(summary);
                }
            }
            (None, None) => {}
        }
    }

    println!(
        "  {} {}",
        "Time elapsed:".bright_cyan(),
        HumanDuration(elapsed)
    );
    println!();
}

fn print_run_summary(summary: &RunSummary) {
    println!(
        "    {} {} ({} accepted, {} excluded)",
        "Rows:".bright_cyan(),
        summary.total_rows.to_string().bright_white().bold(),
        summary.filtered_rows,
        summary.excluded_rows()
    );
    println!(
        "    {} {} seen, {} new",
        "Users:".bright_cyan(),
        summary.unique_users,
        summary.users_created.to_string().bright_white().bold()
    );
    println!(
        "    {} {} seen, {} new",
        "Modules:".bright_cyan(),
        summary.unique_modules,
        summary.modules_created.to_string().bright_white().bold()
    );
    println!(
        "    {} {} written ({} new, {} updated)",
        "Progress:".bright_cyan(),
        summary.progress_updated.to_string().bright_white().bold(),
        summary.progress_inserted,
        summary.progress_overwritten()
    );

    if summary.has_errors() {
        println!(
            "    {} {}",
            "Issues:".bright_yellow(),
            summary.errors.len().to_string().bright_yellow().bold()
        );
        for message in &summary.errors {
            println!("      - {}", message);
        }
    }
}

fn print_database_summary(summary: &DatabaseSummary) {
    println!("\n{}", "Database Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Users:".bright_cyan(),
        summary.total_users.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Modules:".bright_cyan(),
        summary.total_modules.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Progress records:".bright_cyan(),
        summary.total_progress.to_string().bright_white().bold()
    );

    println!("\n{}", "By status".bright_yellow());
    for (status, count) in &summary.progress_by_status {
        println!("  {:<14} {}", status.as_str(), count);
    }

    if !summary.users_by_business_unit.is_empty() {
        println!("\n{}", "By business unit".bright_yellow());
        for unit in &summary.users_by_business_unit {
            println!("  {:<30} {}", unit.name, unit.users);
        }
    }
    println!();
}

fn print_completion_trend(trend: &[CompletionTrendPoint]) {
    println!("{}", "Completions".bright_yellow());
    if trend.is_empty() {
        println!("  (none)");
    }
    for point in trend {
        println!(
            "  {}  {:>5} completed by {} user(s)",
            point.date, point.completed, point.users
        );
    }
    println!();
}

fn print_module_stats(stats: &[ModuleStats]) {
    println!("\n{}", "Module Statistics".bright_green().bold());
    if stats.is_empty() {
        println!("  No modules recorded yet");
        return;
    }

    println!(
        "  {:>4}  {:<45} {:>6} {:>6} {:>6} {:>6} {:>7} {:>6}",
        "ID", "Module", "Users", "Done", "Active", "Reg.", "Rate", "Score"
    );
    for module in stats {
        let score = module
            .average_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>4}  {:<45} {:>6} {:>6} {:>6} {:>6} {:>6.1}% {:>6}",
            module.module_id,
            truncate(&module.name, 45),
            module.users,
            module.completed,
            module.in_progress,
            module.registered,
            module.completion_rate(),
            score
        );
    }
    println!();
}

fn print_user_progress(user_id: &str, user: Option<&User>, progress: &[UserProgressEntry]) {
    let Some(user) = user else {
        println!(
            "{} {}",
            "No user found with id".bright_yellow(),
            user_id.bright_white().bold()
        );
        return;
    };

    println!(
        "\n{} {}",
        user.name.as_deref().unwrap_or(&user.user_id).bright_green().bold(),
        format!("({})", user.email).bright_cyan()
    );

    if progress.is_empty() {
        println!("  No module progress recorded");
    }
    for entry in progress {
        println!(
            "  {:<45} {:<12} {:>10} {:>10} {:>6}",
            truncate(&entry.module_name, 45),
            entry.status.as_str(),
            entry.started_on.as_deref().unwrap_or("-"),
            entry.completed_on.as_deref().unwrap_or("-"),
            entry
                .score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
}

fn print_new_users(since: chrono::NaiveDate, users: &[NewUserEntry]) {
    println!(
        "\n{} {}",
        "Users registered since".bright_green().bold(),
        since.to_string().bright_white().bold()
    );
    if users.is_empty() {
        println!("  No new users");
    }
    for user in users {
        println!(
            "  {:<12} {:<30} {:<30} {:<20} {}",
            user.user_id,
            truncate(user.name.as_deref().unwrap_or("-"), 30),
            truncate(&user.email, 30),
            truncate(user.business_unit.as_deref().unwrap_or("-"), 20),
            user.registered_at.as_deref().unwrap_or("-")
        );
    }
    println!();
}

fn print_business_units(report: &[BusinessUnitReport]) {
    println!("\n{}", "Business Units".bright_green().bold());
    if report.is_empty() {
        println!("  No business units registered");
        return;
    }

    println!(
        "  {:<30} {:>6} {:>8} {:>6} {:>6}",
        "Unit", "Users", "Modules", "Done", "Score"
    );
    for unit in report {
        let score = unit
            .average_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<30} {:>6} {:>8} {:>6} {:>6}",
            truncate(&unit.name, 30),
            unit.users,
            unit.active_modules,
            unit.completed,
            score
        );
    }
    println!();
}

fn print_progress_entries(entries: &[ModuleProgressEntry]) {
    println!("\n{}", "Module Progress".bright_green().bold());
    if entries.is_empty() {
        println!("  No matching enrollments");
    }
    for entry in entries {
        println!(
            "  {:<40} {:<12} {:<25} {:<12} {:>10} {:>10}",
            truncate(&entry.module_name, 40),
            entry.user_id,
            truncate(entry.user_name.as_deref().unwrap_or("-"), 25),
            entry.status.as_str(),
            entry.started_on.as_deref().unwrap_or("-"),
            entry.completed_on.as_deref().unwrap_or("-")
        );
    }
    println!();
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    }
}

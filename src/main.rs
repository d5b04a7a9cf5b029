//! Mortdash - mortality statistics dashboard builder
//!
//! Loads mortality records, cause-of-death descriptions and
//! administrative-division names, joins and cleans them for one
//! reporting year, and renders the dashboard panels as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file or column, bad config, write failure, etc.)
//!   2 - No records for the reporting year and --fail-on-empty set

mod analysis;
mod cli;
mod config;
mod data;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Dashboard, DashboardMetadata, PreparedTable};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration; its verbosity setting decides the log level
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.general.log_level(args.quiet));

    info!("Mortdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_dashboard(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard build failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mortdash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize input files, column names, year and panels.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete dashboard workflow. Returns exit code (0 or 2).
async fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load and prepare the tables
    println!(
        "📥 Loading mortality data for {} from {}",
        config.data.year, config.data.data_dir
    );
    let table = load_table(&config, !args.quiet).await?;

    if table.is_empty() {
        warn!(
            "Prepared table is empty; every panel will be empty for {}",
            config.data.year
        );
    }

    // Handle --dry-run: report preparation counters and exit
    if args.dry_run {
        print_preparation(&table);
        println!("\n✅ Dry run complete. No dashboard was written.");
        return Ok(empty_exit_code(&args, &table));
    }

    // Step 2: Compute the panels
    println!("📊 Computing dashboard panels...");
    let table = Arc::new(table);
    let panels = analysis::compute_panels_concurrent(Arc::clone(&table), &config.views).await?;

    // Step 3: Build and write the dashboard
    let metadata = DashboardMetadata {
        title: config.views.title.clone(),
        year: table.year,
        mortality_source: config.data.mortality_path().display().to_string(),
        causes_source: config.data.causes_path().display().to_string(),
        divisions_source: config.data.divisions_path().display().to_string(),
        stats: table.stats,
        boundary_url: config.views.boundary_url.clone(),
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let dashboard = Dashboard { metadata, panels };

    let output = PathBuf::from(&config.general.output);
    println!("📝 Writing dashboard...");
    report::write_dashboard(&dashboard, config.general.format, &output)?;
    info!("Dashboard written to {}", output.display());

    // Print summary
    println!("\n📈 Dashboard Summary:");
    print_preparation(&table);
    for line in report::generate_summary_text(&dashboard.panels).lines() {
        println!("   {}", line);
    }
    println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Dashboard complete! Saved to: {}", output.display());

    Ok(empty_exit_code(&args, &table))
}

/// Exit code 2 when the table is empty and --fail-on-empty is set.
fn empty_exit_code(args: &Args, table: &PreparedTable) -> i32 {
    if args.fail_on_empty && table.is_empty() {
        eprintln!(
            "\n⛔ No records for {}. Failing (exit code 2).",
            table.year
        );
        2
    } else {
        0
    }
}

fn print_preparation(table: &PreparedTable) {
    let stats = &table.stats;
    println!("   Rows read: {}", stats.source_rows);
    println!("   Records for {}: {}", table.year, stats.year_rows);
    println!("   Without division match: {}", stats.unresolved_divisions);
    println!("   Without cause match: {}", stats.unresolved_causes);
}

/// Load and prepare the tables on a blocking task, with a spinner.
async fn load_table(config: &Config, show_progress: bool) -> Result<PreparedTable> {
    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Preparing tables...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let task_config = config.clone();
    let result = tokio::task::spawn_blocking(move || data::load_and_prepare(&task_config))
        .await
        .context("Preparation task failed")?;

    if let Some(pb) = spinner {
        match &result {
            Ok(_) => pb.finish_with_message("Tables prepared"),
            Err(_) => pb.abandon_with_message("Preparation failed"),
        }
    }

    result
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems with the default file are
/// reported on stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!(
                "⚠️  Ignoring {}: {:#}. Using defaults.",
                DEFAULT_CONFIG_FILE, e
            );
            Ok(Config::default())
        }
    }
}

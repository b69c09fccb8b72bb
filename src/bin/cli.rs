//! Issue Harvester CLI
//!
//! Local execution entry point for harvesting and validating output.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use issue_harvester::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    storage::CheckpointStore,
};

/// Fault-tolerant, resumable issue tracker harvester
#[derive(Parser, Debug)]
#[command(name = "harvester", version, about = "Issue tracker harvester")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest issues for all configured projects
    Scrape {
        /// Override the output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Harvest at most N issues per project
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Validate produced JSONL output files
    Validate {
        /// Directory to validate (default: configured output dir)
        #[arg(long)]
        dir: Option<String>,
    },

    /// Show checkpoint progress and output status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Scrape { output, limit } => {
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            if let Some(limit) = limit {
                config.issue_limit = Some(limit);
            }

            let stats = pipeline::run_scraper(&config).await?;
            log::info!(
                "Done: {} issues, {} comments, {} errors",
                stats.issues_written,
                stats.comments_fetched,
                stats.errors
            );
        }

        Command::Validate { dir } => {
            let dir = dir.unwrap_or_else(|| config.output.dir.clone());
            let report = pipeline::run_validate(&dir)?;
            if !report.all_valid() {
                return Err(AppError::validation(format!(
                    "{} invalid record(s) in {}",
                    report.invalid_lines, dir
                )));
            }
        }

        Command::Info => {
            let checkpoint = CheckpointStore::load(&config.checkpoint.path);
            if checkpoint.projects().is_empty() {
                log::info!("No checkpoint found at {}", config.checkpoint.path);
            }
            let mut entries: Vec<_> = checkpoint.projects().iter().collect();
            entries.sort();
            for (project, offset) in entries {
                log::info!("{project}: {offset} issues processed");
            }

            for project in &config.projects {
                let path = pipeline::output_path(&config.output.dir, project);
                if path.exists() {
                    log::info!("{}: exists", path.display());
                } else {
                    log::info!("{}: not written yet", path.display());
                }
            }
        }
    }

    Ok(())
}

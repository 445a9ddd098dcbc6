// src/main.rs

mod core;

use crate::core::{
    APP_NAME, AppConfig, ConfigManagerOperations, CoreConfigManager, JsonFileVideoRepository,
    RunSummary, backfill_thumbnails, bundle,
};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Dump a source tree into one text bundle per top-level directory.
#[derive(Parser)]
#[command(name = "tree_bundler", version)]
struct Cli {
    /// JSON configuration file (defaults to ./tree_bundler.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the bundles (the default when no subcommand is given)
    Bundle,
    /// Attach existing thumbnail files to ready video records
    BackfillThumbnails {
        /// JSON array of video records, rewritten in place
        #[arg(long)]
        records: PathBuf,
    },
    /// Show the configured enforcement mode
    Enforcement,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Failed to initialize logger: {e}");
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\n[DONE] {} bundles, {} files ({} with errors) → {}",
        summary.bundles.len(),
        summary.total_files(),
        summary.total_failed(),
        summary.output_dir.display()
    );
    for outcome in &summary.bundles {
        println!(
            "  {:<40} {:>5} files  ~{} tokens",
            outcome.name, outcome.files_included, outcome.token_estimate
        );
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let loaded = CoreConfigManager::new(APP_NAME).load_config(cli.config.as_deref())?;
    match &loaded.source {
        Some(path) => log::info!("Using configuration from {}", path.display()),
        None => log::debug!("Using built-in configuration."),
    }
    let AppConfig { bundler, settings } = loaded.config;

    match cli.command.unwrap_or(Commands::Bundle) {
        Commands::Bundle => {
            let summary = bundle(&bundler)?;
            print_summary(&summary);
        }
        Commands::BackfillThumbnails { records } => {
            let mut repo = JsonFileVideoRepository::open(&records)?;
            let report = backfill_thumbnails(&mut repo, &settings)?;
            println!(
                "[DONE] thumbnails set: {}, missing: {}, failed: {}",
                report.updated, report.missing, report.failed
            );
        }
        Commands::Enforcement => {
            println!(
                "enforcement mode: {} (enabled: {})",
                settings.enforcement_mode(),
                settings.enforcement_enabled()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

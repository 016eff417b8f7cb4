//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `typed_import` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use typed_import::config::{Cli, Command, ImportArgs, RunsArgs};
use typed_import::initialization::init_logger_with;
use typed_import::{run_history, run_import, Config, LogFormat, LogLevel, PipelineAbort};

#[tokio::main]
async fn main() -> Result<()> {
    // Lets RUST_LOG live in a .env next to the data
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Import(args) => import(args).await,
        Command::Runs(args) => runs(args).await,
    }
}

async fn import(args: ImportArgs) -> Result<()> {
    let config = Config::from(args);
    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    match run_import(config).await {
        Ok(report) => {
            println!(
                "✅ Loaded {} of {} record{} into '{}' ({} failed) in {:.1}s",
                report.records_loaded,
                report.records_read,
                if report.records_read == 1 { "" } else { "s" },
                report.collection,
                report.records_failed,
                report.elapsed_seconds
            );
            println!(
                "Results saved in {} (run {})",
                report.db_path.display(),
                report.run_id
            );
            Ok(())
        }
        Err(e) => {
            if let Some(abort) = e.downcast_ref::<PipelineAbort>() {
                let stats = &abort.stats;
                eprintln!(
                    "❌ Import aborted: {} read, {} converted, {} loaded, {} failed, {} not written in {:.1}s",
                    stats.records_read,
                    stats.records_converted,
                    stats.records_loaded,
                    stats.records_failed,
                    stats.records_unflushed,
                    stats.elapsed_seconds()
                );
            }
            eprintln!("typed_import error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn runs(args: RunsArgs) -> Result<()> {
    init_logger_with(LogLevel::Warn.into(), LogFormat::Plain)
        .context("Failed to initialize logger")?;

    let runs = match run_history(&args.db_path, args.limit).await {
        Ok(runs) => runs,
        Err(e) => {
            eprintln!("typed_import error: {:#}", e);
            process::exit(1);
        }
    };

    if runs.is_empty() {
        println!("No finished runs in {}", args.db_path.display());
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {:<9} {:>9} read {:>9} loaded {:>7} failed  {:>8.1}s  {} -> {} [{}]",
            run.run_id,
            run.outcome.as_deref().unwrap_or("-"),
            run.records_read.unwrap_or(0),
            run.records_loaded.unwrap_or(0),
            run.records_failed.unwrap_or(0),
            run.elapsed_seconds.unwrap_or(0.0),
            run.source_file,
            run.collection,
            run.schema
        );
    }
    Ok(())
}

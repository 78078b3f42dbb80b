//! graphplot - batch intake of graph plot imagery
//!
//! Exit codes: 0 success, 1 failure, 2 another run holds the lock.

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use graphplot::catalog::JsonFileSink;
use graphplot::preflight;
use graphplot::processing::{DocumentumProcessor, ExternalProcessor, NoopProcessor};
use graphplot::{
    execute, Collaborators, FilenameValidator, GraphplotConfig, GraphplotError, LockError,
    SpoolNotifier,
};
use graphplot_logging::{init_logging, LogConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "graphplot", about = "Validate, route and reconcile graph plot files")]
struct Cli {
    /// Debug-level console logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one full batch
    Run {
        /// Path to the TOML configuration
        #[arg(short, long, env = "GRAPHPLOT_CONFIG")]
        config: PathBuf,
    },

    /// Check every configured resource without processing anything
    Check {
        #[arg(short, long, env = "GRAPHPLOT_CONFIG")]
        config: PathBuf,
    },

    /// Validate file names against the grammar and calendar rules
    ValidateName {
        /// File names to check
        #[arg(required = true)]
        names: Vec<String>,

        /// Treat this as the current year
        #[arg(long)]
        year: Option<i32>,

        /// Allowed extensions (default: tif, gif)
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },
}

fn load_config(path: &Path) -> Result<GraphplotConfig> {
    GraphplotConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn init_file_logging(config: &GraphplotConfig, verbose: bool) {
    let log_dir = config.log_dir();
    let mut log_config = LogConfig::new("graphplot");
    log_config.verbose = verbose;
    log_config.log_dir = Some(&log_dir);
    if let Some(n) = config.logging.max_files {
        log_config.max_files = n;
    }
    if let Some(mb) = config.logging.max_file_size_mb {
        log_config.max_file_size = mb * 1024 * 1024;
    }
    if let Err(e) = init_logging(log_config) {
        eprintln!("Warning: logging not initialised: {:#}", e);
    }
}

fn cmd_run(config_path: &Path, verbose: bool) -> Result<()> {
    let config = load_config(config_path)?;
    init_file_logging(&config, verbose);

    let mut documentum = DocumentumProcessor::from_dirs(
        config.paths.image_dir.clone(),
        config.paths.metacard_dir.clone(),
        config.paths.meta_dir.clone(),
    );
    let mut noop = NoopProcessor;
    let processor: &mut dyn ExternalProcessor = match documentum.as_mut() {
        Some(p) => p,
        None => &mut noop,
    };
    let mut notifier = SpoolNotifier::new(config.spool_dir());
    let mut catalog = JsonFileSink::new(config.paths.json_dir.clone());

    let summary = execute(
        &config,
        Local::now(),
        Collaborators {
            processor,
            notifier: &mut notifier,
            catalog: &mut catalog,
        },
    )?;
    for line in summary.to_lines() {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_check(config_path: &Path, verbose: bool) -> Result<()> {
    let config = load_config(config_path)?;
    init_file_logging(&config, verbose);

    let table = preflight::resource_table(&config);
    let mut failed = Vec::new();
    for resource in &table {
        let status = match preflight::check(resource, &config) {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                failed.push(e.clone());
                format!("FAILED ({})", e)
            }
        };
        let path = resource
            .path(&config)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<48} {}", resource.to_string(), path, status);
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(GraphplotError::Preflight(failed).into())
    }
}

/// Pure name checks; writes nothing, not even a log file.
fn cmd_validate_name(names: &[String], year: Option<i32>, extensions: Vec<String>) -> Result<()> {
    let extensions = if extensions.is_empty() {
        vec!["tif".to_string(), "gif".to_string()]
    } else {
        extensions
    };
    let validator = FilenameValidator::new(&extensions)?;
    let year = year.unwrap_or_else(|| Local::now().year());

    let mut bad = 0;
    for name in names {
        // Size is not known here; treat every name as non-empty.
        match validator.validate(name, 1, year) {
            Ok(parsed) => println!(
                "{}\tOK\tidentifier={} date={} time={}",
                name, parsed.identifier, parsed.date, parsed.time
            ),
            Err(reason) => {
                bad += 1;
                println!("{}\t{}", name, reason);
            }
        }
    }
    if bad > 0 {
        anyhow::bail!("{} of {} names rejected", bad, names.len());
    }
    Ok(())
}

fn is_lock_held(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<GraphplotError>(),
        Some(GraphplotError::Lock(LockError::Locked(_)))
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { config } => cmd_run(config, cli.verbose),
        Commands::Check { config } => cmd_check(config, cli.verbose),
        Commands::ValidateName {
            names,
            year,
            extensions,
        } => cmd_validate_name(names, *year, extensions.clone()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            if is_lock_held(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

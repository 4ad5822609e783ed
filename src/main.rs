//! Leveros Harvest main entry point
//!
//! This is the command-line interface for the Leveros Integra product harvester.

use anyhow::Context;
use clap::Parser;
use leveros_harvest::browser::ChromeLauncher;
use leveros_harvest::config::{load_from_env, Config, CONFIG_PATH_VAR};
use leveros_harvest::output::{load_statistics, print_statistics};
use leveros_harvest::{run_harvest, RunContext};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Leveros Harvest: product listing extraction for the Leveros Integra portal
///
/// Logs into the dealer storefront, walks every product category page by
/// page and writes the collected products to a spreadsheet and a PDF.
/// Credentials are read from LEVEROS_USERNAME and LEVEROS_PASSWORD; an
/// optional TOML file named by LEVEROS_CONFIG overrides the defaults.
#[derive(Parser, Debug)]
#[command(name = "leveros-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Leveros Integra product harvester", long_about = None)]
struct Cli {
    /// Run the browser without a visible window
    #[arg(long)]
    headless: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, source) = load_from_env().with_context(|| {
        format!(
            "Failed to load configuration (overrides from ${})",
            CONFIG_PATH_VAR
        )
    })?;

    // Dropping the guard flushes the log file
    let _guard = setup_logging(&config, cli.verbose, cli.quiet)?;

    match source {
        Some(source) => tracing::info!(
            "Configuration overrides loaded from {} (hash: {})",
            source.path.display(),
            source.hash
        ),
        None => tracing::info!("Using built-in configuration"),
    }

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!("Failed to create output directory {}", config.output.directory)
    })?;
    std::fs::create_dir_all(&config.output.diagnostics_directory).with_context(|| {
        format!(
            "Failed to create diagnostics directory {}",
            config.output.diagnostics_directory
        )
    })?;

    let context = RunContext::new(
        cli.headless,
        &config.output.directory,
        &config.output.diagnostics_directory,
    );
    tracing::info!(
        "Run {} ({} categories, headless: {})",
        context.timestamp,
        config.categories.len(),
        cli.headless
    );

    let launcher = ChromeLauncher::new(config.driver.clone());
    let report = match run_harvest(config, launcher, context).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e).context("Harvest aborted before any category was crawled");
        }
    };

    if !cli.quiet {
        print_statistics(&load_statistics(&report));
    }

    Ok(())
}

/// Sets up console and file logging based on verbosity level
///
/// Log lines go to stdout and are appended to the configured log file.
fn setup_logging(config: &Config, verbose: u8, quiet: bool) -> anyhow::Result<WorkerGuard> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("leveros_harvest=info,warn"),
            1 => EnvFilter::new("leveros_harvest=debug,info"),
            2 => EnvFilter::new("leveros_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_path = Path::new(&config.output.log_file);
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", config.output.log_file))?;

    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(guard)
}

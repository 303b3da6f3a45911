//! trialscope - clinical trial registry ingestion CLI
//!
//! Pulls studies from the ClinicalTrials.gov v2 API, flattens them into a
//! CSV artifact and writes enriched Parquet tables for analysis.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "trialscope")]
#[command(about = "Clinical trial registry ingestion and enrichment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./trialscope.toml or ~/.config/trialscope/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch studies from the registry into a flat CSV artifact
    Fetch(cmd::fetch::FetchArgs),
    /// Enrich a flat CSV artifact into Parquet tables
    Enrich(cmd::enrich::EnrichArgs),
    /// Fetch and enrich in one pass
    Run(cmd::run::RunArgs),
    /// Load the external reference pipeline dataset
    Reference(cmd::reference::ReferenceArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(trialscope_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, spinners show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    trialscope_core::init_logging(quiet, cli.debug, multi);

    let mut config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(secs) = cli.timeout {
        config.registry.timeout_secs = secs;
    }
    if let Some(n) = cli.max_retries {
        config.retry.max_retries = n;
    }

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Enrich(args) => cmd::enrich::run(args, &config, &progress),
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Reference(args) => cmd::reference::run(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Output directory",
                &config.output.default_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Compression level",
                &config.output.compression_level.to_string(),
            ]);
            table.add_row(vec!["Registry URL", &config.registry.base_url]);
            table.add_row(vec!["Page size", &config.registry.page_size.to_string()]);
            table.add_row(vec![
                "Page delay",
                &format!("{}ms", config.registry.page_delay_ms),
            ]);
            table.add_row(vec![
                "Timeout",
                &format!("{}s", config.registry.timeout_secs),
            ]);
            table.add_row(vec!["Max retries", &config.retry.max_retries.to_string()]);
            table.add_row(vec![
                "Backoff base",
                &format!("{}ms", config.retry.backoff_base_ms),
            ]);
            table.add_row(vec![
                "Rate-limit wait",
                &format!("{}ms", config.retry.rate_limit_wait_ms),
            ]);
            table.add_row(vec![
                "Rate-limit waits",
                &config
                    .retry
                    .max_rate_limit_waits
                    .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            ]);
            table.add_row(vec![
                "Taxonomy",
                config.taxonomy.path.as_deref().unwrap_or("built-in"),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}

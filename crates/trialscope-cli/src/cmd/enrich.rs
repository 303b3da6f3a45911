//! Enrich subcommand - flat CSV artifact to Parquet tables

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use trialscope_core::{SharedProgress, fmt_num};
use trialscope_ctgov::FlatTrialRecord;
use trialscope_enrich::{Enricher, TableStats, area_counts, build_long_tables};

use super::{print_area_counts, print_summary};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Flat CSV artifact produced by `fetch`
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Parquet output options shared by `enrich`, `run` and `reference`
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Zstd compression level (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,

    /// Taxonomy TOML overriding the built-in keyword tables
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,
}

impl OutputArgs {
    pub fn dir(&self, config: &Config) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| config.output.default_dir.clone())
    }

    pub fn zstd_level(&self, config: &Config) -> i32 {
        self.zstd_level.unwrap_or(config.output.compression_level)
    }
}

pub fn run(args: EnrichArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let records = trialscope_enrich::read_flat_csv_path(&args.input)?;
    enrich_and_write(records, &args.output, config, progress)
}

/// Enrich, explode and write every trial table, then print the summaries
pub(crate) fn enrich_and_write(
    records: Vec<FlatTrialRecord>,
    args: &OutputArgs,
    config: &Config,
    progress: &SharedProgress,
) -> Result<()> {
    let output_dir = args.dir(config);
    let zstd_level = args.zstd_level(config);
    let taxonomy = config.taxonomy(args.taxonomy.as_deref())?;
    let enricher = Enricher::new(&taxonomy).context("Invalid taxonomy")?;
    log::info!("Taxonomy version {}", taxonomy.version);

    let pb = progress.stage_line("enrich");
    pb.set_message(format!("{} records...", fmt_num(records.len())));
    let enriched = enricher.enrich_records(records);
    let counts = area_counts(&enriched);
    let big_pharma = enriched.iter().filter(|r| r.is_big_pharma).count();
    let long_tables = build_long_tables(&enriched);
    pb.finish_and_clear();

    let pb = progress.stage_line("write");
    pb.set_message(format!("{}...", output_dir.display()));
    let enriched_count = enriched.len();
    let mut stats = vec![write(&output_dir, |dir| {
        trialscope_enrich::write_trials(enriched, dir, zstd_level)
    })?];
    stats.extend(write(&output_dir, |dir| {
        trialscope_enrich::write_long_tables(long_tables, dir, zstd_level)
    })?);
    pb.finish_and_clear();

    let mut rows = vec![
        ("Trials", fmt_num(enriched_count)),
        ("Big pharma", fmt_num(big_pharma)),
        ("Taxonomy", format!("v{}", taxonomy.version)),
    ];
    rows.extend(table_rows(&stats));
    rows.push(("Output", output_dir.display().to_string()));
    print_summary("Enrich", &rows);
    print_area_counts(&counts);
    Ok(())
}

/// Create `dir` and run one Parquet writer against it
pub(crate) fn write<T>(
    dir: &Path,
    writer: impl FnOnce(&Path) -> std::io::Result<T>,
) -> Result<T> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    trialscope_core::cleanup_tmp_files(dir)
        .with_context(|| format!("Failed to clean {}", dir.display()))?;
    writer(dir).with_context(|| format!("Failed to write Parquet into {}", dir.display()))
}

pub(crate) fn table_rows(stats: &[TableStats]) -> Vec<(&'static str, String)> {
    stats
        .iter()
        .map(|s| (s.table, format!("{} rows", fmt_num(s.rows))))
        .collect()
}

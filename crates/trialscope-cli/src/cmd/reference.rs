//! Reference subcommand - external pipeline dataset to Parquet

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use trialscope_core::{SharedProgress, fmt_num};
use trialscope_enrich::AreaClassifier;

use super::enrich::{OutputArgs, table_rows, write};
use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Semicolon-delimited reference CSV
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run(args: ReferenceArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let output_dir = args.output.dir(config);
    let zstd_level = args.output.zstd_level(config);
    let taxonomy = config.taxonomy(args.output.taxonomy.as_deref())?;
    taxonomy.validate()?;
    let areas = AreaClassifier::new(&taxonomy);

    let pb = progress.stage_line("reference");
    pb.set_message(format!("{}...", args.input.display()));
    let records = trialscope_enrich::load_reference(&args.input, &areas)?;
    let assets = records.len();
    let stats = write(&output_dir, |dir| {
        trialscope_enrich::write_reference(records, dir, zstd_level)
    })?;
    pb.finish_and_clear();

    let mut rows = vec![("Assets", fmt_num(assets))];
    rows.extend(table_rows(std::slice::from_ref(&stats)));
    rows.push(("Output", output_dir.display().to_string()));
    print_summary("Reference", &rows);
    Ok(())
}

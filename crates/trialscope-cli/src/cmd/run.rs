//! Run subcommand - fetch, persist the artifact and enrich in one pass

use anyhow::Result;
use clap::Args;

use trialscope_core::SharedProgress;

use super::enrich::{OutputArgs, enrich_and_write};
use super::fetch::{ARTIFACT_NAME, QueryArgs, fetch_records, print_fetch_summary, write_artifact};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Skip writing the flat CSV artifact
    #[arg(long)]
    pub no_artifact: bool,
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let output_dir = args.output.dir(config);

    let (records, summary) = fetch_records(&args.query, config, progress)?;
    if args.no_artifact {
        log::info!("Artifact disabled, skipping {ARTIFACT_NAME}");
    } else {
        let artifact = output_dir.join(ARTIFACT_NAME);
        write_artifact(&artifact, &records)?;
        print_fetch_summary(&summary, &artifact);
    }

    enrich_and_write(records, &args.output, config, progress)
}

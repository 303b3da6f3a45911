//! Fetch subcommand - page through the registry into a flat CSV artifact

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use trialscope_core::{SharedProgress, fmt_num};
use trialscope_ctgov::{FlatTrialRecord, StudyQuery, Summary};

use super::print_summary;
use crate::config::Config;

/// Default artifact name inside the output directory
pub const ARTIFACT_NAME: &str = "trials.csv";

/// Registry search filters
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Condition or disease (query.cond)
    #[arg(long)]
    pub condition: Option<String>,

    /// Intervention or treatment (query.intr)
    #[arg(long)]
    pub intervention: Option<String>,

    /// Location (query.locn)
    #[arg(long)]
    pub location: Option<String>,

    /// Title or acronym (query.titles)
    #[arg(long)]
    pub titles: Option<String>,

    /// Sponsor or collaborator (query.spons)
    #[arg(long)]
    pub sponsor: Option<String>,

    /// Free-text search term
    #[arg(long)]
    pub term: Option<String>,

    /// Overall status filter (comma-separated, e.g. RECRUITING,COMPLETED)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<String>,

    /// Only studies updated on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub updated_from: Option<NaiveDate>,

    /// Only studies updated on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub updated_to: Option<NaiveDate>,

    /// Result order
    #[arg(long, default_value = trialscope_ctgov::query::DEFAULT_SORT)]
    pub sort: String,

    /// Studies per page (1-1000)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Maximum number of pages to request
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Maximum number of studies to keep
    #[arg(short = 'l', long)]
    pub max_records: Option<usize>,
}

impl QueryArgs {
    pub fn to_query(&self) -> StudyQuery {
        let day = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();
        StudyQuery {
            condition: self.condition.clone(),
            intervention: self.intervention.clone(),
            location: self.location.clone(),
            titles: self.titles.clone(),
            sponsor: self.sponsor.clone(),
            term: self.term.clone(),
            overall_status: self.status.clone(),
            last_update_from: self.updated_from.as_ref().map(day),
            last_update_to: self.updated_to.as_ref().map(day),
            sort: self.sort.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Output CSV file (default: <output dir>/trials.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date format: {e}"))
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| config.output.default_dir.join(ARTIFACT_NAME));

    let (records, summary) = fetch_records(&args.query, config, progress)?;
    write_artifact(&output, &records)?;

    print_fetch_summary(&summary, &output);
    Ok(())
}

/// Fetch and flatten with the configured registry settings
pub(crate) fn fetch_records(
    args: &QueryArgs,
    config: &Config,
    progress: &SharedProgress,
) -> Result<(Vec<FlatTrialRecord>, Summary)> {
    let mut ctgov = config.ctgov(args.max_pages, args.max_records);
    if let Some(size) = args.page_size {
        ctgov.fetch.page_size = size;
    }

    let pb = progress.stage_line("fetch");
    let result = trialscope_ctgov::run(&ctgov, &args.to_query(), &pb);
    pb.finish_and_clear();

    result.context("Registry fetch failed")
}

pub(crate) fn write_artifact(path: &Path, records: &[FlatTrialRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    trialscope_enrich::write_flat_csv_path(path, records)
}

pub(crate) fn print_fetch_summary(summary: &Summary, artifact: &Path) {
    print_summary(
        "Fetch",
        &[
            ("Studies", fmt_num(summary.studies_fetched)),
            ("Pages", fmt_num(summary.pages)),
            ("Requests", fmt_num(summary.requests)),
            ("Stopped", summary.stop.to_string()),
            ("Records", fmt_num(summary.flatten.flattened)),
            (
                "Skipped",
                format!(
                    "{} without nctId, {} duplicates",
                    summary.flatten.missing_id, summary.flatten.duplicates
                ),
            ),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
            ("Artifact", artifact.display().to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        query: QueryArgs,
    }

    #[test]
    fn query_from_flags() {
        let cli = TestCli::parse_from([
            "test",
            "--condition",
            "asthma",
            "--status",
            "RECRUITING,COMPLETED",
            "--updated-from",
            "2020-01-01",
            "-l",
            "50",
        ]);
        let q = cli.query.to_query();
        assert_eq!(q.condition.as_deref(), Some("asthma"));
        assert_eq!(q.overall_status, vec!["RECRUITING", "COMPLETED"]);
        assert_eq!(q.last_update_from.as_deref(), Some("2020-01-01"));
        assert_eq!(q.last_update_to, None);
        assert_eq!(q.sort, trialscope_ctgov::query::DEFAULT_SORT);
        assert_eq!(cli.query.max_records, Some(50));
    }

    #[test]
    fn rejects_bad_date() {
        assert!(TestCli::try_parse_from(["test", "--updated-to", "2020/01/01"]).is_err());
    }

    #[test]
    fn parse_date_valid() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }
}

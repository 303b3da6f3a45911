//! Flat trial CSV: the persisted hand-off between fetch and enrich

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use trialscope_ctgov::FlatTrialRecord;

use crate::listcodec::{decode_list, encode_list};

/// Column order of the artifact
pub const COLUMNS: [&str; 15] = [
    "nctId",
    "briefTitle",
    "officialTitle",
    "overallStatus",
    "startDate",
    "primaryCompletionDate",
    "completionDate",
    "studyType",
    "phase",
    "enrollmentCount",
    "conditions",
    "condition",
    "leadSponsor",
    "collaborators",
    "countries",
];

fn opt(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or_default()
}

pub fn write_flat_csv<W: Write>(writer: W, records: &[FlatTrialRecord]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(COLUMNS)?;
    for r in records {
        let enrollment = r.enrollment_count.map(|n| n.to_string()).unwrap_or_default();
        out.write_record([
            r.nct_id.as_str(),
            opt(&r.brief_title),
            opt(&r.official_title),
            opt(&r.overall_status),
            opt(&r.start_date),
            opt(&r.primary_completion_date),
            opt(&r.completion_date),
            opt(&r.study_type),
            opt(&r.phase),
            enrollment.as_str(),
            encode_list(&r.conditions).as_str(),
            opt(&r.condition),
            opt(&r.lead_sponsor),
            encode_list(&r.collaborators).as_str(),
            encode_list(&r.countries).as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Write `<path>` through `<path>.tmp` so a partial file never appears
pub fn write_flat_csv_path(path: &Path, records: &[FlatTrialRecord]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    let file =
        File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    write_flat_csv(file, records).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to rename {} → {}", tmp.display(), path.display()))?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Column positions resolved from the header row; absent columns read as empty
struct Columns([Option<usize>; COLUMNS.len()]);

impl Columns {
    fn new(headers: &StringRecord) -> Result<Self> {
        let idx = COLUMNS.map(|name| headers.iter().position(|h| h.trim() == name));
        if idx[0].is_none() {
            anyhow::bail!("CSV missing required header 'nctId'");
        }
        Ok(Self(idx))
    }

    fn cell<'r>(&self, row: &'r StringRecord, col: usize) -> &'r str {
        self.0[col].and_then(|i| row.get(i)).unwrap_or_default()
    }

    fn text(&self, row: &StringRecord, col: usize) -> Option<String> {
        let v = self.cell(row, col);
        (!v.is_empty()).then(|| v.to_string())
    }

    fn list(&self, row: &StringRecord, col: usize) -> Result<Vec<String>> {
        decode_list(self.cell(row, col)).with_context(|| format!("column {}", COLUMNS[col]))
    }
}

/// Integer count; `120` and `120.0` both read as 120, anything else as absent
fn parse_count(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Read the flat artifact. Rows without `nctId` are skipped.
pub fn read_flat_csv<R: Read>(reader: R) -> Result<Vec<FlatTrialRecord>> {
    let mut input = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let cols = Columns::new(input.headers().context("Failed to read CSV header")?)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (i, row) in input.records().enumerate() {
        let line = i + 2;
        let row = row.with_context(|| format!("Failed to read CSV row {line}"))?;

        let nct_id = cols.cell(&row, 0).trim();
        if nct_id.is_empty() {
            skipped += 1;
            continue;
        }

        let record = (|| -> Result<FlatTrialRecord> {
            Ok(FlatTrialRecord {
                nct_id: nct_id.to_string(),
                brief_title: cols.text(&row, 1),
                official_title: cols.text(&row, 2),
                overall_status: cols.text(&row, 3),
                start_date: cols.text(&row, 4),
                primary_completion_date: cols.text(&row, 5),
                completion_date: cols.text(&row, 6),
                study_type: cols.text(&row, 7),
                phase: cols.text(&row, 8),
                enrollment_count: parse_count(cols.cell(&row, 9)),
                conditions: cols.list(&row, 10)?,
                condition: cols.text(&row, 11),
                lead_sponsor: cols.text(&row, 12),
                collaborators: cols.list(&row, 13)?,
                countries: cols.list(&row, 14)?,
            })
        })()
        .with_context(|| format!("Malformed CSV row {line} ({nct_id})"))?;
        records.push(record);
    }

    if skipped > 0 {
        log::warn!("{skipped} CSV rows without nctId skipped");
    }
    Ok(records)
}

pub fn read_flat_csv_path(path: &Path) -> Result<Vec<FlatTrialRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records =
        read_flat_csv(file).with_context(|| format!("Failed to read {}", path.display()))?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

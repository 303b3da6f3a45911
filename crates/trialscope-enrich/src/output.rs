//! Parquet output of the enriched, long and reference tables

use std::path::{Path, PathBuf};

use trialscope_core::{ParquetSink, write_rows};

use crate::enrich::EnrichedTrialRecord;
use crate::explode::{ListColumn, LongTables};
use crate::reference::ReferenceRecord;
use crate::schema;
use crate::transform::{LongTableAccumulator, ReferenceAccumulator, TrialAccumulator};

pub const TRIALS_TABLE: &str = "trials";
pub const REFERENCE_TABLE: &str = "reference_pipeline";

/// Rows written per output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub table: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

pub fn write_trials(
    records: Vec<EnrichedTrialRecord>,
    output_dir: &Path,
    zstd_level: i32,
) -> std::io::Result<TableStats> {
    let mut sink = ParquetSink::new(TRIALS_TABLE, output_dir, schema::trials(), zstd_level)?;
    let path = sink.final_path().to_path_buf();
    write_rows(&mut TrialAccumulator::new(), records, &mut sink)?;
    let rows = sink.finalize()?;
    log::info!("{TRIALS_TABLE}: {rows} rows → {}", path.display());
    Ok(TableStats {
        table: TRIALS_TABLE,
        path,
        rows,
    })
}

pub fn write_long_tables(
    tables: LongTables,
    output_dir: &Path,
    zstd_level: i32,
) -> std::io::Result<Vec<TableStats>> {
    let LongTables {
        countries,
        collaborators,
        conditions,
    } = tables;
    let mut stats = Vec::with_capacity(3);
    for (column, rows) in [
        (ListColumn::Countries, countries),
        (ListColumn::Collaborators, collaborators),
        (ListColumn::Conditions, conditions),
    ] {
        let table = column.table_name();
        let mut sink = ParquetSink::new(
            table,
            output_dir,
            schema::long_table_schema(column),
            zstd_level,
        )?;
        let path = sink.final_path().to_path_buf();
        write_rows(&mut LongTableAccumulator::new(column), rows, &mut sink)?;
        let rows = sink.finalize()?;
        log::info!("{table}: {rows} rows → {}", path.display());
        stats.push(TableStats { table, path, rows });
    }
    Ok(stats)
}

pub fn write_reference(
    records: Vec<ReferenceRecord>,
    output_dir: &Path,
    zstd_level: i32,
) -> std::io::Result<TableStats> {
    let mut sink = ParquetSink::new(REFERENCE_TABLE, output_dir, schema::reference(), zstd_level)?;
    let path = sink.final_path().to_path_buf();
    write_rows(&mut ReferenceAccumulator::new(), records, &mut sink)?;
    let rows = sink.finalize()?;
    log::info!("{REFERENCE_TABLE}: {rows} rows → {}", path.display());
    Ok(TableStats {
        table: REFERENCE_TABLE,
        path,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialscope_core::is_valid_parquet;
    use trialscope_ctgov::FlatTrialRecord;

    use crate::enrich::enrich_records;
    use crate::explode::build_long_tables;

    #[test]
    fn writes_all_trial_tables() {
        let dir = tempfile::tempdir().unwrap();
        let enriched = enrich_records(vec![FlatTrialRecord {
            nct_id: "NCT1".into(),
            countries: vec!["US".into(), "US".into(), "FR".into()],
            conditions: vec!["Asthma".into()],
            ..Default::default()
        }]);
        let tables = build_long_tables(&enriched);

        let trials = write_trials(enriched, dir.path(), 3).unwrap();
        assert_eq!(trials.rows, 1);
        assert!(is_valid_parquet(&trials.path));

        let stats = write_long_tables(tables, dir.path(), 3).unwrap();
        let rows: Vec<(&str, usize)> = stats.iter().map(|s| (s.table, s.rows)).collect();
        assert_eq!(
            rows,
            vec![
                ("trial_countries", 3),
                ("trial_collaborators", 0),
                ("trial_conditions", 1)
            ]
        );
        for s in &stats {
            assert!(is_valid_parquet(&s.path));
        }
    }
}

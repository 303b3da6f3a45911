//! Flat CSV → enrichment → Parquet tables

use std::fs::File;
use std::path::Path;

use arrow::array::{AsArray, RecordBatch};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use trialscope_enrich::{
    build_long_tables, enrich_records, read_flat_csv, write_flat_csv_path, write_long_tables,
    write_trials,
};

const ARTIFACT: &str = "\
nctId,briefTitle,officialTitle,overallStatus,startDate,primaryCompletionDate,completionDate,studyType,phase,enrollmentCount,conditions,condition,leadSponsor,collaborators,countries
NCT00000001,Drug X in  Breast Cancer,,RECRUITING,2023-05-15,2025-06,,INTERVENTIONAL,PHASE2,120.0,\"['Breast Cancer', 'HER2-positive']\",Breast Cancer,Pfizer Inc.,[],\"['United States', 'France', 'United States']\"
NCT00000002,Asthma Registry,,COMPLETED,2019,,2021-12-31,OBSERVATIONAL,,45,['Asthma'],Asthma,Unrelated Biotech,\"['Novartis AG', \"\"Women's Health Initiative\"\"]\",[]
NCT00000003,Healthy volunteers,,WITHDRAWN,,,,INTERVENTIONAL,PHASE1,,[],,,[],\"['Japan']\"
";

fn read_batches(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).unwrap();
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .map(|b| b.unwrap())
        .collect()
}

#[test]
fn csv_to_parquet() {
    let records = read_flat_csv(ARTIFACT.as_bytes()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].enrollment_count, Some(120));
    assert_eq!(records[1].collaborators.len(), 2);

    let enriched = enrich_records(records);
    let areas: Vec<&str> = enriched.iter().map(|e| e.therapeutic_area.as_str()).collect();
    assert_eq!(areas, vec!["Oncology", "Immunology", "Other"]);
    let big: Vec<bool> = enriched.iter().map(|e| e.is_big_pharma).collect();
    assert_eq!(big, vec![true, true, false]);
    assert_eq!(enriched[1].start_month.as_deref(), Some("2019-01"));

    let tables = build_long_tables(&enriched);
    assert_eq!(tables.countries.len(), 4);
    assert_eq!(tables.collaborators.len(), 2);
    assert_eq!(tables.conditions.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let trials = write_trials(enriched, dir.path(), 3).unwrap();
    let long = write_long_tables(tables, dir.path(), 3).unwrap();

    let batches = read_batches(&trials.path);
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(total, 3);
    let clean = batches[0]
        .column_by_name("leadSponsor_clean")
        .unwrap()
        .as_string::<i32>();
    assert_eq!(clean.value(0), "Pfizer");

    let countries = long.iter().find(|s| s.table == "trial_countries").unwrap();
    let batches = read_batches(&countries.path);
    let values: Vec<&str> = batches[0]
        .column_by_name("country")
        .unwrap()
        .as_string::<i32>()
        .iter()
        .map(|v| v.unwrap())
        .collect();
    assert_eq!(values, vec!["United States", "France", "United States", "Japan"]);
}

#[test]
fn artifact_survives_file_round_trip() {
    let records = read_flat_csv(ARTIFACT.as_bytes()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trials.csv");
    write_flat_csv_path(&path, &records).unwrap();
    let back = trialscope_enrich::read_flat_csv_path(&path).unwrap();
    assert_eq!(back, records);
}

use std::sync::Arc;

use arrow::array::{RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use trialscope_core::ParquetSink;

fn synthetic_long_table(n: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("nctId", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
    ]));
    let ids = StringArray::from((0..n).map(|i| format!("NCT{i:08}")).collect::<Vec<_>>());
    let countries = StringArray::from(
        (0..n)
            .map(|i| ["United States", "France", "Japan"][i % 3])
            .collect::<Vec<_>>(),
    );
    RecordBatch::try_new(schema, vec![Arc::new(ids), Arc::new(countries)]).unwrap()
}

#[divan::bench(args = [1, 3, 6])]
fn parquet_write_zstd(bencher: divan::Bencher, zstd_level: i32) {
    let batch = synthetic_long_table(8192);
    let schema = batch.schema();
    let dir = tempfile::tempdir().unwrap();
    bencher.bench(|| {
        let mut sink = ParquetSink::new("bench", dir.path(), schema.as_ref(), zstd_level).unwrap();
        sink.write_batch(&batch).unwrap();
        sink.finalize().unwrap();
    });
}

fn main() {
    divan::main();
}

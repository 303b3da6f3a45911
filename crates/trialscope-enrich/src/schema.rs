//! Arrow schema definitions for the output tables

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

use crate::explode::ListColumn;

/// Enriched trials, one row per `nctId`
pub static TRIALS: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        // === Registry fields ===
        Field::new("nctId", DataType::Utf8, false),
        Field::new("briefTitle", DataType::Utf8, true),
        Field::new("officialTitle", DataType::Utf8, true),
        Field::new("overallStatus", DataType::Utf8, true),
        Field::new("startDate", DataType::Utf8, true),
        Field::new("primaryCompletionDate", DataType::Utf8, true),
        Field::new("completionDate", DataType::Utf8, true),
        Field::new("studyType", DataType::Utf8, true),
        Field::new("phase", DataType::Utf8, true),
        Field::new("enrollmentCount", DataType::Int64, true),
        Field::new("conditions", list_utf8(), false),
        Field::new("condition", DataType::Utf8, true),
        Field::new("leadSponsor", DataType::Utf8, true),
        Field::new("collaborators", list_utf8(), false),
        Field::new("countries", list_utf8(), false),
        // === Derived ===
        Field::new("startDate_dt", DataType::Date32, true),
        Field::new("primaryCompletionDate_dt", DataType::Date32, true),
        Field::new("completionDate_dt", DataType::Date32, true),
        Field::new("start_year", DataType::Int32, true),
        Field::new("start_month", DataType::Utf8, true),
        Field::new("leadSponsor_clean", DataType::Utf8, true),
        Field::new("therapeutic_area", DataType::Utf8, false),
        Field::new("is_big_pharma", DataType::Boolean, false),
    ]))
});

pub static COUNTRIES: LazyLock<Arc<Schema>> =
    LazyLock::new(|| long_table(ListColumn::Countries));
pub static COLLABORATORS: LazyLock<Arc<Schema>> =
    LazyLock::new(|| long_table(ListColumn::Collaborators));
pub static CONDITIONS: LazyLock<Arc<Schema>> =
    LazyLock::new(|| long_table(ListColumn::Conditions));

/// Reference pipeline assets
pub static REFERENCE: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("therapy_area", DataType::Utf8, true),
        Field::new("indication", DataType::Utf8, true),
        Field::new("phase", DataType::Utf8, true),
        Field::new("phase_std", DataType::Utf8, false),
        Field::new("mode_of_action", DataType::Utf8, true),
        Field::new("notes", DataType::Utf8, true),
        Field::new("reason", DataType::Utf8, true),
        Field::new("company", DataType::Utf8, true),
        Field::new("company_std", DataType::Utf8, false),
        Field::new("therapeutic_area", DataType::Utf8, false),
    ]))
});

fn long_table(column: ListColumn) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("nctId", DataType::Utf8, false),
        Field::new(column.value_column(), DataType::Utf8, false),
    ]))
}

/// Helper: create List<Utf8> type
fn list_utf8() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

pub fn trials() -> &'static Arc<Schema> {
    &TRIALS
}

pub fn long_table_schema(column: ListColumn) -> &'static Arc<Schema> {
    match column {
        ListColumn::Countries => &COUNTRIES,
        ListColumn::Collaborators => &COLLABORATORS,
        ListColumn::Conditions => &CONDITIONS,
    }
}

pub fn reference() -> &'static Arc<Schema> {
    &REFERENCE
}

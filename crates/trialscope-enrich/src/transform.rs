//! Enriched rows → Arrow `RecordBatch`

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Int32Array, Int64Array, ListBuilder, RecordBatch,
    StringArray, StringBuilder,
};
use arrow::datatypes::Schema;
use arrow::error::ArrowError;
use trialscope_core::Accumulator;

use crate::enrich::EnrichedTrialRecord;
use crate::explode::{ListColumn, LongTableRow};
use crate::normalize::days_since_epoch;
use crate::reference::ReferenceRecord;
use crate::schema;

/// Accumulator for enriched trial rows
pub struct TrialAccumulator {
    schema: Arc<Schema>,
    nct_id: Vec<String>,
    brief_title: Vec<Option<String>>,
    official_title: Vec<Option<String>>,
    overall_status: Vec<Option<String>>,
    start_date: Vec<Option<String>>,
    primary_completion_date: Vec<Option<String>>,
    completion_date: Vec<Option<String>>,
    study_type: Vec<Option<String>>,
    phase: Vec<Option<String>>,
    enrollment_count: Vec<Option<i64>>,
    conditions: Vec<Vec<String>>,
    condition: Vec<Option<String>>,
    lead_sponsor: Vec<Option<String>>,
    collaborators: Vec<Vec<String>>,
    countries: Vec<Vec<String>>,
    // Derived
    start_date_dt: Vec<Option<i32>>,
    primary_completion_date_dt: Vec<Option<i32>>,
    completion_date_dt: Vec<Option<i32>>,
    start_year: Vec<Option<i32>>,
    start_month: Vec<Option<String>>,
    lead_sponsor_clean: Vec<Option<String>>,
    therapeutic_area: Vec<String>,
    is_big_pharma: Vec<bool>,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self {
            schema: schema::trials().clone(),
            nct_id: Vec::new(),
            brief_title: Vec::new(),
            official_title: Vec::new(),
            overall_status: Vec::new(),
            start_date: Vec::new(),
            primary_completion_date: Vec::new(),
            completion_date: Vec::new(),
            study_type: Vec::new(),
            phase: Vec::new(),
            enrollment_count: Vec::new(),
            conditions: Vec::new(),
            condition: Vec::new(),
            lead_sponsor: Vec::new(),
            collaborators: Vec::new(),
            countries: Vec::new(),
            start_date_dt: Vec::new(),
            primary_completion_date_dt: Vec::new(),
            completion_date_dt: Vec::new(),
            start_year: Vec::new(),
            start_month: Vec::new(),
            lead_sponsor_clean: Vec::new(),
            therapeutic_area: Vec::new(),
            is_big_pharma: Vec::new(),
        }
    }
}

impl Default for TrialAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for TrialAccumulator {
    type Row = EnrichedTrialRecord;

    fn push(&mut self, row: EnrichedTrialRecord) {
        let t = row.trial;
        self.nct_id.push(t.nct_id);
        self.brief_title.push(t.brief_title);
        self.official_title.push(t.official_title);
        self.overall_status.push(t.overall_status);
        self.start_date.push(t.start_date);
        self.primary_completion_date.push(t.primary_completion_date);
        self.completion_date.push(t.completion_date);
        self.study_type.push(t.study_type);
        self.phase.push(t.phase);
        self.enrollment_count.push(t.enrollment_count);
        self.conditions.push(t.conditions);
        self.condition.push(t.condition);
        self.lead_sponsor.push(t.lead_sponsor);
        self.collaborators.push(t.collaborators);
        self.countries.push(t.countries);

        self.start_date_dt.push(row.start_date_dt.map(days_since_epoch));
        self.primary_completion_date_dt
            .push(row.primary_completion_date_dt.map(days_since_epoch));
        self.completion_date_dt
            .push(row.completion_date_dt.map(days_since_epoch));
        self.start_year.push(row.start_year);
        self.start_month.push(row.start_month);
        self.lead_sponsor_clean.push(row.lead_sponsor_clean);
        self.therapeutic_area.push(row.therapeutic_area);
        self.is_big_pharma.push(row.is_big_pharma);
    }

    fn len(&self) -> usize {
        self.nct_id.len()
    }

    fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.nct_id))),
            Arc::new(StringArray::from(std::mem::take(&mut self.brief_title))),
            Arc::new(StringArray::from(std::mem::take(&mut self.official_title))),
            Arc::new(StringArray::from(std::mem::take(&mut self.overall_status))),
            Arc::new(StringArray::from(std::mem::take(&mut self.start_date))),
            Arc::new(StringArray::from(std::mem::take(
                &mut self.primary_completion_date,
            ))),
            Arc::new(StringArray::from(std::mem::take(&mut self.completion_date))),
            Arc::new(StringArray::from(std::mem::take(&mut self.study_type))),
            Arc::new(StringArray::from(std::mem::take(&mut self.phase))),
            Arc::new(Int64Array::from(std::mem::take(&mut self.enrollment_count))),
            build_list_string_array(std::mem::take(&mut self.conditions)),
            Arc::new(StringArray::from(std::mem::take(&mut self.condition))),
            Arc::new(StringArray::from(std::mem::take(&mut self.lead_sponsor))),
            build_list_string_array(std::mem::take(&mut self.collaborators)),
            build_list_string_array(std::mem::take(&mut self.countries)),
            Arc::new(Date32Array::from(std::mem::take(&mut self.start_date_dt))),
            Arc::new(Date32Array::from(std::mem::take(
                &mut self.primary_completion_date_dt,
            ))),
            Arc::new(Date32Array::from(std::mem::take(
                &mut self.completion_date_dt,
            ))),
            Arc::new(Int32Array::from(std::mem::take(&mut self.start_year))),
            Arc::new(StringArray::from(std::mem::take(&mut self.start_month))),
            Arc::new(StringArray::from(std::mem::take(
                &mut self.lead_sponsor_clean,
            ))),
            Arc::new(StringArray::from(std::mem::take(&mut self.therapeutic_area))),
            Arc::new(BooleanArray::from(std::mem::take(&mut self.is_big_pharma))),
        ];
        RecordBatch::try_new(self.schema.clone(), arrays)
    }
}

/// Accumulator for one `(nctId, value)` long table
pub struct LongTableAccumulator {
    schema: Arc<Schema>,
    nct_id: Vec<String>,
    value: Vec<String>,
}

impl LongTableAccumulator {
    pub fn new(column: ListColumn) -> Self {
        Self {
            schema: schema::long_table_schema(column).clone(),
            nct_id: Vec::new(),
            value: Vec::new(),
        }
    }
}

impl Accumulator for LongTableAccumulator {
    type Row = LongTableRow;

    fn push(&mut self, row: LongTableRow) {
        self.nct_id.push(row.nct_id);
        self.value.push(row.value);
    }

    fn len(&self) -> usize {
        self.nct_id.len()
    }

    fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.nct_id))),
            Arc::new(StringArray::from(std::mem::take(&mut self.value))),
        ];
        RecordBatch::try_new(self.schema.clone(), arrays)
    }
}

/// Accumulator for reference pipeline assets
pub struct ReferenceAccumulator {
    schema: Arc<Schema>,
    name: Vec<Option<String>>,
    therapy_area: Vec<Option<String>>,
    indication: Vec<Option<String>>,
    phase: Vec<Option<String>>,
    phase_std: Vec<&'static str>,
    mode_of_action: Vec<Option<String>>,
    notes: Vec<Option<String>>,
    reason: Vec<Option<String>>,
    company: Vec<Option<String>>,
    company_std: Vec<String>,
    therapeutic_area: Vec<String>,
}

impl ReferenceAccumulator {
    pub fn new() -> Self {
        Self {
            schema: schema::reference().clone(),
            name: Vec::new(),
            therapy_area: Vec::new(),
            indication: Vec::new(),
            phase: Vec::new(),
            phase_std: Vec::new(),
            mode_of_action: Vec::new(),
            notes: Vec::new(),
            reason: Vec::new(),
            company: Vec::new(),
            company_std: Vec::new(),
            therapeutic_area: Vec::new(),
        }
    }
}

impl Default for ReferenceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for ReferenceAccumulator {
    type Row = ReferenceRecord;

    fn push(&mut self, row: ReferenceRecord) {
        self.name.push(row.name);
        self.therapy_area.push(row.therapy_area);
        self.indication.push(row.indication);
        self.phase.push(row.phase);
        self.phase_std.push(row.phase_std.label());
        self.mode_of_action.push(row.mode_of_action);
        self.notes.push(row.notes);
        self.reason.push(row.reason);
        self.company.push(row.company);
        self.company_std.push(row.company_std);
        self.therapeutic_area.push(row.therapeutic_area);
    }

    fn len(&self) -> usize {
        self.phase_std.len()
    }

    fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.name))),
            Arc::new(StringArray::from(std::mem::take(&mut self.therapy_area))),
            Arc::new(StringArray::from(std::mem::take(&mut self.indication))),
            Arc::new(StringArray::from(std::mem::take(&mut self.phase))),
            Arc::new(StringArray::from(std::mem::take(&mut self.phase_std))),
            Arc::new(StringArray::from(std::mem::take(&mut self.mode_of_action))),
            Arc::new(StringArray::from(std::mem::take(&mut self.notes))),
            Arc::new(StringArray::from(std::mem::take(&mut self.reason))),
            Arc::new(StringArray::from(std::mem::take(&mut self.company))),
            Arc::new(StringArray::from(std::mem::take(&mut self.company_std))),
            Arc::new(StringArray::from(std::mem::take(&mut self.therapeutic_area))),
        ];
        RecordBatch::try_new(self.schema.clone(), arrays)
    }
}

/// Build a non-null List<Utf8> array; empty lists stay empty, not null
fn build_list_string_array(data: Vec<Vec<String>>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for items in &data {
        for item in items {
            builder.values().append_value(item);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Date32Type;
    use trialscope_ctgov::FlatTrialRecord;

    use crate::enrich::enrich_records;
    use crate::reference::PhaseStd;

    fn sample() -> Vec<EnrichedTrialRecord> {
        enrich_records(vec![
            FlatTrialRecord {
                nct_id: "NCT1".into(),
                start_date: Some("1970-01-11".into()),
                enrollment_count: Some(40),
                condition: Some("Asthma".into()),
                countries: vec!["France".into(), "Spain".into()],
                lead_sponsor: Some("Bayer AG".into()),
                ..Default::default()
            },
            FlatTrialRecord {
                nct_id: "NCT2".into(),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn trial_batch_matches_schema() {
        let mut acc = TrialAccumulator::new();
        for r in sample() {
            acc.push(r);
        }
        assert_eq!(acc.len(), 2);

        let batch = acc.take_batch().unwrap();
        assert!(acc.is_empty());
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 23);

        let countries = batch.column_by_name("countries").unwrap().as_list::<i32>();
        assert_eq!(countries.value(0).len(), 2);
        assert_eq!(countries.value(1).len(), 0);
        assert!(!countries.is_null(1));

        let start = batch
            .column_by_name("startDate_dt")
            .unwrap()
            .as_primitive::<Date32Type>();
        assert_eq!(start.value(0), 10);
        assert!(start.is_null(1));

        let area = batch.column_by_name("therapeutic_area").unwrap().as_string::<i32>();
        assert_eq!(area.value(0), "Immunology");
        assert_eq!(area.value(1), "Other");

        let big = batch.column_by_name("is_big_pharma").unwrap().as_boolean();
        assert!(big.value(0));
        assert!(!big.value(1));
    }

    #[test]
    fn long_table_batch() {
        let mut acc = LongTableAccumulator::new(ListColumn::Countries);
        acc.push(LongTableRow {
            nct_id: "NCT1".into(),
            value: "France".into(),
        });
        let batch = acc.take_batch().unwrap();
        assert_eq!(batch.schema().field(1).name(), "country");
        assert_eq!(batch.num_rows(), 1);
    }

    #[test]
    fn reference_batch() {
        let mut acc = ReferenceAccumulator::new();
        acc.push(ReferenceRecord {
            name: Some("Drug A".into()),
            therapy_area: None,
            indication: None,
            phase: Some("Phase 2".into()),
            phase_std: PhaseStd::Phase2,
            mode_of_action: None,
            notes: None,
            reason: None,
            company: None,
            company_std: "GSK".into(),
            therapeutic_area: "Other".into(),
        });
        let batch = acc.take_batch().unwrap();
        let phase = batch.column_by_name("phase_std").unwrap().as_string::<i32>();
        assert_eq!(phase.value(0), "Phase 2");
    }
}

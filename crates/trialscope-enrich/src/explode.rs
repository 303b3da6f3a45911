//! One-row-per-element join tables for the list-valued columns

use trialscope_ctgov::FlatTrialRecord;

use crate::enrich::EnrichedTrialRecord;

/// List-valued column of a trial record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListColumn {
    Countries,
    Collaborators,
    Conditions,
}

impl ListColumn {
    pub const ALL: [ListColumn; 3] = [Self::Countries, Self::Collaborators, Self::Conditions];

    /// Value column name in the long table
    pub fn value_column(self) -> &'static str {
        match self {
            Self::Countries => "country",
            Self::Collaborators => "collaborator",
            Self::Conditions => "condition",
        }
    }

    /// Output table (file stem)
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Countries => "trial_countries",
            Self::Collaborators => "trial_collaborators",
            Self::Conditions => "trial_conditions",
        }
    }

    pub fn values(self, record: &FlatTrialRecord) -> &[String] {
        match self {
            Self::Countries => &record.countries,
            Self::Collaborators => &record.collaborators,
            Self::Conditions => &record.conditions,
        }
    }
}

/// `(nctId, value)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongTableRow {
    pub nct_id: String,
    pub value: String,
}

/// Explode one column. Blank elements are dropped; other values and repeats are kept as-is.
pub fn explode<'a>(
    records: impl IntoIterator<Item = &'a FlatTrialRecord>,
    column: ListColumn,
) -> Vec<LongTableRow> {
    records
        .into_iter()
        .flat_map(|r| {
            column
                .values(r)
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(move |v| LongTableRow {
                    nct_id: r.nct_id.clone(),
                    value: v.clone(),
                })
        })
        .collect()
}

/// The three long tables of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LongTables {
    pub countries: Vec<LongTableRow>,
    pub collaborators: Vec<LongTableRow>,
    pub conditions: Vec<LongTableRow>,
}

impl LongTables {
    pub fn get(&self, column: ListColumn) -> &[LongTableRow] {
        match column {
            ListColumn::Countries => &self.countries,
            ListColumn::Collaborators => &self.collaborators,
            ListColumn::Conditions => &self.conditions,
        }
    }
}

pub fn build_long_tables(records: &[EnrichedTrialRecord]) -> LongTables {
    let trials = || records.iter().map(|r| &r.trial);
    LongTables {
        countries: explode(trials(), ListColumn::Countries),
        collaborators: explode(trials(), ListColumn::Collaborators),
        conditions: explode(trials(), ListColumn::Conditions),
    }
}

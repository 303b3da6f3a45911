//! Flat trial row produced from one study document

/// One registry study projected onto the fixed tabular schema.
///
/// List-valued fields are always present; an absent list in the source
/// document reads as an empty `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTrialRecord {
    pub nct_id: String,
    pub brief_title: Option<String>,
    pub official_title: Option<String>,
    pub overall_status: Option<String>,
    pub start_date: Option<String>,
    pub primary_completion_date: Option<String>,
    pub completion_date: Option<String>,
    pub study_type: Option<String>,
    /// First declared phase
    pub phase: Option<String>,
    pub enrollment_count: Option<i64>,
    /// All conditions, in registry order (may repeat)
    pub conditions: Vec<String>,
    /// Primary condition: first of `conditions`
    pub condition: Option<String>,
    pub lead_sponsor: Option<String>,
    pub collaborators: Vec<String>,
    /// Distinct location countries, first-seen order
    pub countries: Vec<String>,
}

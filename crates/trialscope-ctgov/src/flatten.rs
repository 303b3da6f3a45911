//! Study document → [`FlatTrialRecord`] projection

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::path::Section;
use crate::record::FlatTrialRecord;

/// Project one raw study onto the flat schema.
///
/// Total: any missing section yields `None`/empty fields, never an error.
pub fn flatten_study(doc: &Value) -> FlatTrialRecord {
    let ps = Section::root(doc).section("protocolSection");
    let ident = ps.section("identificationModule");
    let status = ps.section("statusModule");
    let design = ps.section("designModule");
    let conds = ps.section("conditionsModule");
    let sponsor = ps.section("sponsorCollaboratorsModule");
    let contacts = ps.section("contactsLocationsModule");

    let conditions: Vec<String> = conds.strings("conditions").map(String::from).collect();
    let condition = conditions.first().cloned();

    let phase = design.list("phases").first().and_then(Value::as_str).map(String::from);

    let collaborators = sponsor
        .list("collaborators")
        .iter()
        .filter(|c| c.is_object())
        .filter_map(|c| Section::root(c).text("name"))
        .map(String::from)
        .collect();

    FlatTrialRecord {
        nct_id: ident.text("nctId").unwrap_or_default().to_string(),
        brief_title: ident.text("briefTitle").map(String::from),
        official_title: ident.text("officialTitle").map(String::from),
        overall_status: status.text("overallStatus").map(String::from),
        start_date: status.section("startDateStruct").text("date").map(String::from),
        primary_completion_date: status
            .section("primaryCompletionDateStruct")
            .text("date")
            .map(String::from),
        completion_date: status
            .section("completionDateStruct")
            .text("date")
            .map(String::from),
        study_type: design.text("studyType").map(String::from),
        phase,
        enrollment_count: design.section("enrollmentInfo").int("count"),
        conditions,
        condition,
        lead_sponsor: sponsor.section("leadSponsor").text("name").map(String::from),
        collaborators,
        countries: location_countries(contacts.list("locations")),
    }
}

/// Distinct non-empty `country` values over well-formed location entries
fn location_countries(locations: &[Value]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    locations
        .iter()
        .filter(|loc| loc.is_object())
        .filter_map(|loc| Section::root(loc).text("country"))
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(*c))
        .map(String::from)
        .collect()
}

/// Counters from flattening a batch of studies
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenStats {
    pub flattened: usize,
    pub missing_id: usize,
    pub duplicates: usize,
}

/// Flatten a fetched batch, keeping the `nctId` key non-empty and unique.
///
/// Documents are projected in parallel; order of the input is preserved and
/// the first occurrence of a repeated `nctId` wins.
pub fn flatten_studies(docs: &[Value]) -> (Vec<FlatTrialRecord>, FlattenStats) {
    let flat: Vec<FlatTrialRecord> = docs.par_iter().map(flatten_study).collect();

    let mut stats = FlattenStats::default();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut records = Vec::with_capacity(flat.len());
    for record in flat {
        if record.nct_id.is_empty() {
            stats.missing_id += 1;
            continue;
        }
        if !seen.insert(record.nct_id.clone()) {
            log::debug!("duplicate study {} dropped", record.nct_id);
            stats.duplicates += 1;
            continue;
        }
        records.push(record);
    }
    stats.flattened = records.len();

    if stats.missing_id > 0 {
        log::warn!("{} studies without nctId skipped", stats.missing_id);
    }
    if stats.duplicates > 0 {
        log::warn!("{} duplicate studies skipped", stats.duplicates);
    }
    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_study() -> Value {
        json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT01234567",
                    "briefTitle": "A Study of Drug X",
                    "officialTitle": "A Randomized Study of Drug X in Adults"
                },
                "statusModule": {
                    "overallStatus": "RECRUITING",
                    "startDateStruct": {"date": "2023-05-15", "type": "ACTUAL"},
                    "primaryCompletionDateStruct": {"date": "2025-06"},
                    "completionDateStruct": {"date": "2026-01-31"}
                },
                "designModule": {
                    "studyType": "INTERVENTIONAL",
                    "phases": ["PHASE2", "PHASE3"],
                    "enrollmentInfo": {"count": 120, "type": "ESTIMATED"}
                },
                "conditionsModule": {
                    "conditions": ["Breast Cancer", "HER2-positive", "Breast Cancer"]
                },
                "sponsorCollaboratorsModule": {
                    "leadSponsor": {"name": "Pfizer Inc.", "class": "INDUSTRY"},
                    "collaborators": [
                        {"name": "Novartis AG"},
                        "not-an-object",
                        {"class": "OTHER"},
                        {"name": "University Hospital"}
                    ]
                },
                "contactsLocationsModule": {
                    "locations": [
                        {"facility": "A", "country": "United States"},
                        {"facility": "B", "country": "France"},
                        {"facility": "C", "country": "United States"},
                        {"facility": "D"},
                        {"facility": "E", "country": null},
                        {"facility": "F", "country": ""},
                        42
                    ]
                }
            }
        })
    }

    #[test]
    fn flattens_scalar_fields() {
        let r = flatten_study(&full_study());
        assert_eq!(r.nct_id, "NCT01234567");
        assert_eq!(r.brief_title.as_deref(), Some("A Study of Drug X"));
        assert_eq!(r.overall_status.as_deref(), Some("RECRUITING"));
        assert_eq!(r.start_date.as_deref(), Some("2023-05-15"));
        assert_eq!(r.primary_completion_date.as_deref(), Some("2025-06"));
        assert_eq!(r.completion_date.as_deref(), Some("2026-01-31"));
        assert_eq!(r.study_type.as_deref(), Some("INTERVENTIONAL"));
        assert_eq!(r.enrollment_count, Some(120));
        assert_eq!(r.lead_sponsor.as_deref(), Some("Pfizer Inc."));
    }

    #[test]
    fn phase_is_first_declared() {
        let r = flatten_study(&full_study());
        assert_eq!(r.phase.as_deref(), Some("PHASE2"));
    }

    #[test]
    fn conditions_keep_order_and_repeats() {
        let r = flatten_study(&full_study());
        assert_eq!(
            r.conditions,
            vec!["Breast Cancer", "HER2-positive", "Breast Cancer"]
        );
        assert_eq!(r.condition.as_deref(), Some("Breast Cancer"));
    }

    #[test]
    fn collaborators_skip_malformed_entries() {
        let r = flatten_study(&full_study());
        assert_eq!(r.collaborators, vec!["Novartis AG", "University Hospital"]);
    }

    #[test]
    fn countries_deduplicated_and_malformed_skipped() {
        let r = flatten_study(&full_study());
        assert_eq!(r.countries, vec!["United States", "France"]);
    }

    #[test]
    fn empty_document_flattens_to_empty_record() {
        let r = flatten_study(&json!({}));
        assert_eq!(r, FlatTrialRecord::default());
        assert!(r.conditions.is_empty());
        assert!(r.collaborators.is_empty());
        assert!(r.countries.is_empty());
        assert!(r.condition.is_none());
        assert!(r.phase.is_none());
    }

    #[test]
    fn null_modules_tolerated() {
        let doc = json!({
            "protocolSection": {
                "identificationModule": {"nctId": "NCT00000001"},
                "designModule": null,
                "conditionsModule": {"conditions": null},
                "sponsorCollaboratorsModule": {"leadSponsor": null, "collaborators": null},
                "contactsLocationsModule": {"locations": "n/a"}
            }
        });
        let r = flatten_study(&doc);
        assert_eq!(r.nct_id, "NCT00000001");
        assert!(r.phase.is_none());
        assert!(r.lead_sponsor.is_none());
        assert!(r.conditions.is_empty());
        assert!(r.countries.is_empty());
    }

    #[test]
    fn empty_phase_list_is_none() {
        let doc = json!({"protocolSection": {"designModule": {"phases": []}}});
        assert!(flatten_study(&doc).phase.is_none());
    }

    #[test]
    fn batch_skips_missing_ids_and_duplicates() {
        let a = json!({"protocolSection": {"identificationModule": {"nctId": "NCT1", "briefTitle": "first"}}});
        let dup = json!({"protocolSection": {"identificationModule": {"nctId": "NCT1", "briefTitle": "second"}}});
        let b = json!({"protocolSection": {"identificationModule": {"nctId": "NCT2"}}});
        let anon = json!({"protocolSection": {}});

        let (records, stats) = flatten_studies(&[a, anon, dup, b]);

        assert_eq!(
            records.iter().map(|r| r.nct_id.as_str()).collect::<Vec<_>>(),
            vec!["NCT1", "NCT2"]
        );
        assert_eq!(records[0].brief_title.as_deref(), Some("first"));
        assert_eq!(
            stats,
            FlattenStats {
                flattened: 2,
                missing_id: 1,
                duplicates: 1
            }
        );
    }
}

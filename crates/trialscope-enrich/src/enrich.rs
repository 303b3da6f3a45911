//! Per-record enrichment: normalization plus classification

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use trialscope_ctgov::FlatTrialRecord;

use crate::classify::{AreaClassifier, SponsorClassifier};
use crate::normalize::{SponsorCanonicalizer, month_label, norm_field, parse_date};
use crate::taxonomy::{Taxonomy, TaxonomyError};

static DEFAULT_ENRICHER: LazyLock<Enricher> = LazyLock::new(|| {
    Enricher::new(&Taxonomy::default()).expect("built-in taxonomy is valid")
});

/// A flat record with text normalized and derived fields attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedTrialRecord {
    pub trial: FlatTrialRecord,
    pub start_date_dt: Option<NaiveDate>,
    pub primary_completion_date_dt: Option<NaiveDate>,
    pub completion_date_dt: Option<NaiveDate>,
    pub start_year: Option<i32>,
    /// `YYYY-MM`
    pub start_month: Option<String>,
    pub lead_sponsor_clean: Option<String>,
    pub therapeutic_area: String,
    pub is_big_pharma: bool,
}

/// Normalizer and classifiers built from one taxonomy
#[derive(Debug, Clone)]
pub struct Enricher {
    canonicalizer: SponsorCanonicalizer,
    areas: AreaClassifier,
    sponsors: SponsorClassifier,
}

impl Enricher {
    pub fn new(taxonomy: &Taxonomy) -> Result<Self, TaxonomyError> {
        taxonomy.validate()?;
        let canonicalizer =
            SponsorCanonicalizer::new(&taxonomy.legal_suffixes).map_err(|e| {
                TaxonomyError::BadPattern {
                    pattern: taxonomy.legal_suffixes.join("|"),
                    message: e.to_string(),
                }
            })?;
        Ok(Self {
            canonicalizer,
            areas: AreaClassifier::new(taxonomy),
            sponsors: SponsorClassifier::new(taxonomy)?,
        })
    }

    pub fn areas(&self) -> &AreaClassifier {
        &self.areas
    }

    pub fn enrich(&self, mut trial: FlatTrialRecord) -> EnrichedTrialRecord {
        for field in [
            &mut trial.brief_title,
            &mut trial.official_title,
            &mut trial.overall_status,
            &mut trial.study_type,
            &mut trial.phase,
            &mut trial.condition,
            &mut trial.lead_sponsor,
        ] {
            norm_field(field);
        }

        let date = |v: &Option<String>| v.as_deref().and_then(parse_date);
        let start_date_dt = date(&trial.start_date);
        let primary_completion_date_dt = date(&trial.primary_completion_date);
        let completion_date_dt = date(&trial.completion_date);

        let lead_sponsor_clean = trial
            .lead_sponsor
            .as_deref()
            .and_then(|s| self.canonicalizer.canonicalize(s));
        let therapeutic_area = self.areas.classify(trial.condition.as_deref()).to_string();
        let is_big_pharma = self
            .sponsors
            .is_big_pharma(trial.lead_sponsor.as_deref(), &trial.collaborators);

        EnrichedTrialRecord {
            start_year: start_date_dt.map(|d| d.year()),
            start_month: start_date_dt.map(month_label),
            start_date_dt,
            primary_completion_date_dt,
            completion_date_dt,
            lead_sponsor_clean,
            therapeutic_area,
            is_big_pharma,
            trial,
        }
    }

    /// Enrich in parallel; output order matches input order
    pub fn enrich_records(&self, records: Vec<FlatTrialRecord>) -> Vec<EnrichedTrialRecord> {
        let enriched: Vec<EnrichedTrialRecord> =
            records.into_par_iter().map(|r| self.enrich(r)).collect();
        log::debug!("Enriched {} records", enriched.len());
        enriched
    }
}

/// [`Enricher::enrich_records`] with the built-in taxonomy
pub fn enrich_records(records: Vec<FlatTrialRecord>) -> Vec<EnrichedTrialRecord> {
    DEFAULT_ENRICHER.enrich_records(records)
}

/// Record count per therapeutic area, most frequent first (ties by label)
pub fn area_counts(records: &[EnrichedTrialRecord]) -> Vec<(String, usize)> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for r in records {
        *counts.entry(r.therapeutic_area.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, n)| (label.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

//! Keyword tables behind the classifiers.
//!
//! The built-in table is version 1. A TOML file can replace any part of it:
//!
//! ```toml
//! version = 2
//! legal_suffixes = ["inc", "ltd"]
//! big_pharma = ["pfizer", "roche|genentech"]
//!
//! [[areas]]
//! label = "Oncology"
//! keywords = ["cancer", "tumor"]
//! reference_keywords = ["oncolog"]
//! ```
//!
//! Omitted top-level keys keep their built-in values.

use std::path::Path;

use anyhow::Context;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Version of the built-in table
pub const BUILTIN_VERSION: u32 = 1;

/// Fallback label when no area matches
pub const OTHER: &str = "Other";

/// One therapeutic area and its substring keywords
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AreaRule {
    pub label: String,
    pub keywords: Vec<String>,
    /// Extra keywords used only for declared therapy areas of the reference dataset
    #[serde(default)]
    pub reference_keywords: Vec<String>,
}

impl AreaRule {
    fn new(label: &str, keywords: &[&str], reference_keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reference_keywords: reference_keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered, versioned classification tables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    pub version: u32,
    /// Evaluated in order; first match wins
    pub areas: Vec<AreaRule>,
    /// Regex fragments, each anchored at word boundaries and matched case-insensitively
    pub big_pharma: Vec<String>,
    /// Legal-entity tokens removed from sponsor names
    pub legal_suffixes: Vec<String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let areas = vec![
            AreaRule::new(
                "Oncology",
                &[
                    "cancer", "tumor", "carcinoma", "neoplasm", "lymphoma", "leukemia", "melanoma",
                    "sarcoma",
                ],
                &["oncolog"],
            ),
            AreaRule::new(
                "Cardiology",
                &["cardio", "heart", "coronary", "myocard", "hypertension", "stroke"],
                &[],
            ),
            AreaRule::new(
                "Neurology",
                &[
                    "alzheimer",
                    "parkinson",
                    "epile",
                    "multiple sclerosis",
                    "migraine",
                    "dementia",
                ],
                &["neuro"],
            ),
            AreaRule::new(
                "Immunology",
                &["rheumatoid", "lupus", "psoriasis", "crohn", "colitis", "asthma", "eczema"],
                &["immun"],
            ),
            AreaRule::new(
                "Infectious",
                &["covid", "hiv", "hepatitis", "influenza", "tuberculosis", "malaria"],
                &["infect"],
            ),
            AreaRule::new(
                "Endocrine/Metabolic",
                &["diabetes", "obesity", "thyroid", "metabolic", "hyperlipid", "cholesterol"],
                &[],
            ),
            AreaRule::new(
                "Psychiatry",
                &["depression", "anxiety", "schizophrenia", "bipolar", "addiction", "opioid"],
                &[],
            ),
        ];

        let big_pharma = [
            "pfizer",
            "roche|genentech",
            "novartis",
            "astrazeneca",
            "sanofi",
            "gsk|glaxosmithkline",
            "bayer",
            "merck|msd",
            "abbvie",
            r"janssen|johnson\s*&\s*johnson|johnson and johnson",
            "bristol-?myers|bms",
            r"eli\s*lilly|lilly",
            "takeda",
            "amgen",
            "boehringer",
        ];

        let legal_suffixes = ["inc", "inc.", "ltd", "llc", "plc", "gmbh", "sa", "ag", "bv"];

        Self {
            version: BUILTIN_VERSION,
            areas,
            big_pharma: big_pharma.iter().map(|p| p.to_string()).collect(),
            legal_suffixes: legal_suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Why a taxonomy was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    NoAreas,
    DuplicateLabel(String),
    /// `Other` is the fallback and cannot be a named area
    ReservedLabel,
    EmptyKeywords(String),
    BadPattern { pattern: String, message: String },
}

impl std::fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAreas => write!(f, "taxonomy defines no therapeutic areas"),
            Self::DuplicateLabel(label) => write!(f, "duplicate area label: {label}"),
            Self::ReservedLabel => write!(f, "'{OTHER}' is reserved for unmatched conditions"),
            Self::EmptyKeywords(label) => write!(f, "area {label} has no keywords"),
            Self::BadPattern { pattern, message } => {
                write!(f, "invalid big pharma pattern '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for TaxonomyError {}

impl Taxonomy {
    /// Parse a TOML override; missing keys fall back to the built-in table
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let taxonomy: Self = toml::from_str(content).context("Failed to parse taxonomy")?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy: {}", path.display()))?;
        let taxonomy = Self::from_toml(&content)
            .with_context(|| format!("Invalid taxonomy: {}", path.display()))?;
        log::info!(
            "Loaded taxonomy v{} from {} ({} areas)",
            taxonomy.version,
            path.display(),
            taxonomy.areas.len()
        );
        Ok(taxonomy)
    }

    /// Labels in evaluation order, followed by the fallback
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.areas
            .iter()
            .map(|a| a.label.as_str())
            .chain(std::iter::once(OTHER))
    }

    pub fn validate(&self) -> Result<(), TaxonomyError> {
        if self.areas.is_empty() {
            return Err(TaxonomyError::NoAreas);
        }
        let mut seen = FxHashSet::default();
        for area in &self.areas {
            if area.label == OTHER {
                return Err(TaxonomyError::ReservedLabel);
            }
            if !seen.insert(area.label.as_str()) {
                return Err(TaxonomyError::DuplicateLabel(area.label.clone()));
            }
            if area.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(TaxonomyError::EmptyKeywords(area.label.clone()));
            }
        }
        for pattern in &self.big_pharma {
            Regex::new(pattern).map_err(|e| TaxonomyError::BadPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_valid() {
        let t = Taxonomy::default();
        assert_eq!(t.version, BUILTIN_VERSION);
        assert_eq!(t.areas.len(), 7);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn builtin_label_order() {
        let taxonomy = Taxonomy::default();
        let labels: Vec<&str> = taxonomy.labels().collect();
        assert_eq!(
            labels,
            vec![
                "Oncology",
                "Cardiology",
                "Neurology",
                "Immunology",
                "Infectious",
                "Endocrine/Metabolic",
                "Psychiatry",
                "Other"
            ]
        );
    }

    #[test]
    fn partial_override_keeps_builtin_rest() {
        let t = Taxonomy::from_toml(
            r#"
            version = 2

            [[areas]]
            label = "Respiratory"
            keywords = ["copd", "asthma"]
            "#,
        )
        .unwrap();
        assert_eq!(t.version, 2);
        assert_eq!(t.areas.len(), 1);
        assert!(t.areas[0].reference_keywords.is_empty());
        assert_eq!(t.big_pharma, Taxonomy::default().big_pharma);
        assert_eq!(t.legal_suffixes, Taxonomy::default().legal_suffixes);
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut t = Taxonomy::default();
        t.areas.push(t.areas[0].clone());
        assert_eq!(
            t.validate(),
            Err(TaxonomyError::DuplicateLabel("Oncology".into()))
        );
    }

    #[test]
    fn rejects_reserved_and_empty() {
        let mut t = Taxonomy::default();
        t.areas[0].label = OTHER.into();
        assert_eq!(t.validate(), Err(TaxonomyError::ReservedLabel));

        let mut t = Taxonomy::default();
        t.areas[1].keywords = vec!["  ".into()];
        assert_eq!(
            t.validate(),
            Err(TaxonomyError::EmptyKeywords("Cardiology".into()))
        );

        let t = Taxonomy {
            areas: Vec::new(),
            ..Taxonomy::default()
        };
        assert_eq!(t.validate(), Err(TaxonomyError::NoAreas));
    }

    #[test]
    fn rejects_bad_pattern() {
        let t = Taxonomy {
            big_pharma: vec!["pfizer(".into()],
            ..Taxonomy::default()
        };
        assert!(matches!(t.validate(), Err(TaxonomyError::BadPattern { .. })));
    }

    #[test]
    fn invalid_toml_is_error() {
        assert!(Taxonomy::from_toml("areas = 3").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.toml");
        std::fs::write(&path, "big_pharma = [\"acme\"]\n").unwrap();
        let t = Taxonomy::load(&path).unwrap();
        assert_eq!(t.big_pharma, vec!["acme"]);
        assert_eq!(t.areas.len(), 7);
    }
}

//! Therapeutic-area and big-pharma classifiers

use regex::{Regex, RegexBuilder};

use crate::taxonomy::{OTHER, Taxonomy, TaxonomyError};

#[derive(Debug, Clone)]
struct CompiledArea {
    label: String,
    keywords: Vec<String>,
    /// `keywords` followed by the reference-only extras
    reference_keywords: Vec<String>,
}

/// Ordered first-match substring classifier. Total: misses map to `Other`.
#[derive(Debug, Clone)]
pub struct AreaClassifier {
    areas: Vec<CompiledArea>,
}

fn lowered(keywords: &[String]) -> impl Iterator<Item = String> + '_ {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
}

impl AreaClassifier {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let areas = taxonomy
            .areas
            .iter()
            .map(|area| {
                let keywords: Vec<String> = lowered(&area.keywords).collect();
                let reference_keywords = keywords
                    .iter()
                    .cloned()
                    .chain(lowered(&area.reference_keywords))
                    .collect();
                CompiledArea {
                    label: area.label.clone(),
                    keywords,
                    reference_keywords,
                }
            })
            .collect();
        Self { areas }
    }

    /// Area for a trial condition
    pub fn classify(&self, condition: Option<&str>) -> &str {
        self.first_match(condition.unwrap_or_default(), |a| &a.keywords)
    }

    /// Area for a reference asset: declared therapy area and indication, space-joined
    pub fn classify_declared(&self, therapy_area: Option<&str>, indication: Option<&str>) -> &str {
        let text = format!(
            "{} {}",
            therapy_area.unwrap_or_default(),
            indication.unwrap_or_default()
        );
        self.first_match(&text, |a| &a.reference_keywords)
    }

    fn first_match<'a>(
        &'a self,
        text: &str,
        keywords: impl Fn(&'a CompiledArea) -> &'a Vec<String>,
    ) -> &'a str {
        if text.trim().is_empty() {
            return OTHER;
        }
        let text = text.to_lowercase();
        self.areas
            .iter()
            .find(|area| keywords(area).iter().any(|k| text.contains(k.as_str())))
            .map_or(OTHER, |area| area.label.as_str())
    }
}

/// Case-insensitive word-boundary match against major pharmaceutical organizations
#[derive(Debug, Clone)]
pub struct SponsorClassifier {
    pattern: Option<Regex>,
}

impl SponsorClassifier {
    pub fn new(taxonomy: &Taxonomy) -> Result<Self, TaxonomyError> {
        let alternation = taxonomy
            .big_pharma
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!(r"\b(?:{p})\b"))
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map_err(|e| TaxonomyError::BadPattern {
                pattern: alternation.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Lead sponsor and every collaborator, space-joined, tested as one text
    pub fn is_big_pharma(&self, lead_sponsor: Option<&str>, collaborators: &[String]) -> bool {
        let mut text = lead_sponsor.unwrap_or_default().to_string();
        for c in collaborators {
            text.push(' ');
            text.push_str(c);
        }
        self.matches(&text)
    }
}

//! Field normalization: dates, free text, sponsor names

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse a registry date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` (first of month) and `YYYY` (January 1st).
/// Anything else yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() == 7 {
        return NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok();
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1);
    }
    None
}

/// `YYYY-MM` period label
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Days since 1970-01-01, the Arrow `Date32` representation
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Trim and collapse whitespace runs to a single space
pub fn norm_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`norm_text`] over an optional field, in place
pub fn norm_field(field: &mut Option<String>) {
    if let Some(v) = field.as_mut() {
        *v = norm_text(v);
    }
}

/// Upper-case the first letter of every letter run, lower-case the rest.
///
/// Any non-letter (digit, `&`, `-`, space) starts a new run, so
/// `bristol-myers squibb` becomes `Bristol-Myers Squibb`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Canonical display form of sponsor names
#[derive(Debug, Clone)]
pub struct SponsorCanonicalizer {
    /// `None` when no suffix tokens are configured
    legal_suffix: Option<Regex>,
    punctuation: Regex,
}

impl SponsorCanonicalizer {
    /// Build from legal-entity suffix tokens (matched at word boundaries)
    pub fn new(legal_suffixes: &[String]) -> Result<Self, regex::Error> {
        let alternation = legal_suffixes
            .iter()
            .map(|s| regex::escape(&s.to_lowercase()))
            .collect::<Vec<_>>()
            .join("|");
        let legal_suffix = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\b(?:{alternation})\b"))?)
        };
        Ok(Self {
            legal_suffix,
            punctuation: Regex::new(r"[^\w\s&-]")?,
        })
    }

    /// Lower-case, strip legal suffixes and punctuation, collapse whitespace, title-case.
    ///
    /// Blank input, or input that is nothing but suffixes and punctuation, yields `None`.
    pub fn canonicalize(&self, name: &str) -> Option<String> {
        if name.trim().is_empty() {
            return None;
        }
        let lower = name.to_lowercase();
        let stripped = match &self.legal_suffix {
            Some(re) => re.replace_all(&lower, ""),
            None => lower.as_str().into(),
        };
        let spaced = self.punctuation.replace_all(&stripped, " ");
        let collapsed = norm_text(&spaced);
        if collapsed.is_empty() {
            None
        } else {
            Some(title_case(&collapsed))
        }
    }
}

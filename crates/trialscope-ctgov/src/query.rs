//! Study search query and its `/studies` query-string encoding

use serde::Deserialize;

/// Default result order: most recently updated first
pub const DEFAULT_SORT: &str = "LastUpdatePostDate:desc";

/// Lower bound used when only the end of the update range is given
pub const RANGE_START_EPOCH: &str = "1900-01-01";

/// Upper bound marker for an open-ended update range
pub const RANGE_OPEN_END: &str = "MAX";

/// Structured filters for a registry search.
///
/// Empty strings are treated like absent filters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudyQuery {
    /// `query.cond`
    pub condition: Option<String>,
    /// `query.intr`
    pub intervention: Option<String>,
    /// `query.locn`
    pub location: Option<String>,
    /// `query.titles`
    pub titles: Option<String>,
    /// `query.spons`
    pub sponsor: Option<String>,
    /// Free-text `query.term`, combined with the update range when both are set
    pub term: Option<String>,
    /// `filter.overallStatus` values (e.g. `RECRUITING`)
    pub overall_status: Vec<String>,
    pub last_update_from: Option<String>,
    pub last_update_to: Option<String>,
    pub sort: String,
}

impl Default for StudyQuery {
    fn default() -> Self {
        Self {
            condition: None,
            intervention: None,
            location: None,
            titles: None,
            sponsor: None,
            term: None,
            overall_status: Vec::new(),
            last_update_from: None,
            last_update_to: None,
            sort: DEFAULT_SORT.to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl StudyQuery {
    /// `AREA[LastUpdatePostDate]RANGE[start,end]` when either bound is set
    pub fn update_range_expr(&self) -> Option<String> {
        let from = non_empty(&self.last_update_from);
        let to = non_empty(&self.last_update_to);
        if from.is_none() && to.is_none() {
            return None;
        }
        Some(format!(
            "AREA[LastUpdatePostDate]RANGE[{},{}]",
            from.unwrap_or(RANGE_START_EPOCH),
            to.unwrap_or(RANGE_OPEN_END)
        ))
    }

    /// Final `query.term`: the caller's term, the update range, or `(term) AND range`
    pub fn effective_term(&self) -> Option<String> {
        match (non_empty(&self.term), self.update_range_expr()) {
            (Some(term), Some(range)) => Some(format!("({term}) AND {range}")),
            (Some(term), None) => Some(term.to_string()),
            (None, range) => range,
        }
    }

    /// Query pairs for the first page; the fetcher appends `pageToken` for later pages.
    pub fn to_params(&self, page_size: u32) -> Vec<(String, String)> {
        let mut params = vec![
            ("pageSize".to_string(), page_size.to_string()),
            ("sort".to_string(), self.sort.clone()),
        ];

        let keyword_filters = [
            ("query.cond", &self.condition),
            ("query.intr", &self.intervention),
            ("query.locn", &self.location),
            ("query.titles", &self.titles),
            ("query.spons", &self.sponsor),
        ];
        for (key, value) in keyword_filters {
            if let Some(v) = non_empty(value) {
                params.push((key.to_string(), v.to_string()));
            }
        }

        if let Some(term) = self.effective_term() {
            params.push(("query.term".to_string(), term));
        }

        if !self.overall_status.is_empty() {
            params.push((
                "filter.overallStatus".to_string(),
                self.overall_status.join(","),
            ));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_query_has_only_size_and_sort() {
        let params = StudyQuery::default().to_params(200);
        assert_eq!(params.len(), 2);
        assert_eq!(param(&params, "pageSize"), Some("200"));
        assert_eq!(param(&params, "sort"), Some(DEFAULT_SORT));
    }

    #[test]
    fn range_defaults_open_end() {
        let q = StudyQuery {
            last_update_from: Some("2020-01-01".into()),
            ..Default::default()
        };
        assert_eq!(
            q.effective_term().as_deref(),
            Some("AREA[LastUpdatePostDate]RANGE[2020-01-01,MAX]")
        );
    }

    #[test]
    fn range_defaults_epoch_start() {
        let q = StudyQuery {
            last_update_to: Some("2024-12-31".into()),
            ..Default::default()
        };
        assert_eq!(
            q.update_range_expr().as_deref(),
            Some("AREA[LastUpdatePostDate]RANGE[1900-01-01,2024-12-31]")
        );
    }

    #[test]
    fn term_and_range_combined() {
        let q = StudyQuery {
            term: Some("heart failure".into()),
            last_update_from: Some("2020-01-01".into()),
            last_update_to: Some("MAX".into()),
            ..Default::default()
        };
        assert_eq!(
            q.effective_term().as_deref(),
            Some("(heart failure) AND AREA[LastUpdatePostDate]RANGE[2020-01-01,MAX]")
        );
    }

    #[test]
    fn term_alone_passes_through() {
        let q = StudyQuery {
            term: Some("aspirin".into()),
            ..Default::default()
        };
        assert_eq!(q.effective_term().as_deref(), Some("aspirin"));
    }

    #[test]
    fn empty_strings_are_ignored() {
        let q = StudyQuery {
            condition: Some(String::new()),
            term: Some(String::new()),
            last_update_from: Some(String::new()),
            ..Default::default()
        };
        let params = q.to_params(10);
        assert!(param(&params, "query.cond").is_none());
        assert!(param(&params, "query.term").is_none());
    }

    #[test]
    fn keyword_filters_and_statuses() {
        let q = StudyQuery {
            condition: Some("lung cancer".into()),
            intervention: Some("pembrolizumab".into()),
            location: Some("Spain".into()),
            titles: Some("adjuvant".into()),
            sponsor: Some("Merck".into()),
            overall_status: vec!["RECRUITING".into(), "ACTIVE_NOT_RECRUITING".into()],
            ..Default::default()
        };
        let params = q.to_params(1000);
        assert_eq!(param(&params, "query.cond"), Some("lung cancer"));
        assert_eq!(param(&params, "query.intr"), Some("pembrolizumab"));
        assert_eq!(param(&params, "query.locn"), Some("Spain"));
        assert_eq!(param(&params, "query.titles"), Some("adjuvant"));
        assert_eq!(param(&params, "query.spons"), Some("Merck"));
        assert_eq!(
            param(&params, "filter.overallStatus"),
            Some("RECRUITING,ACTIVE_NOT_RECRUITING")
        );
        assert!(param(&params, "pageToken").is_none());
    }

    #[test]
    fn deserializes_with_default_sort() {
        let q: StudyQuery = serde_json::from_str(r#"{"condition":"asthma"}"#).unwrap();
        assert_eq!(q.condition.as_deref(), Some("asthma"));
        assert_eq!(q.sort, DEFAULT_SORT);
    }
}

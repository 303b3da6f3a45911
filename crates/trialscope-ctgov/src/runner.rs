//! Fetch + flatten orchestration

use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use trialscope_core::fmt_num;

use crate::config::Config;
use crate::fetcher::{FetchError, HttpTransport, PagedFetcher, StopReason, Transport};
use crate::flatten::{FlattenStats, flatten_studies};
use crate::query::StudyQuery;
use crate::record::FlatTrialRecord;

/// Outcome of one registry run
#[derive(Debug, Clone)]
pub struct Summary {
    pub studies_fetched: usize,
    pub pages: usize,
    /// Requests sent, retries included
    pub requests: usize,
    pub stop: StopReason,
    pub flatten: FlattenStats,
    pub elapsed: Duration,
}

impl Summary {
    pub fn log(&self) {
        log::info!("=== Fetch Summary ===");
        log::info!(
            "Studies: {} from {} pages, {} requests ({})",
            self.studies_fetched,
            self.pages,
            self.requests,
            self.stop
        );
        log::info!(
            "Records: {} ({} without nctId, {} duplicates)",
            self.flatten.flattened,
            self.flatten.missing_id,
            self.flatten.duplicates
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Fetch from the live registry and flatten the result
pub fn run(
    config: &Config,
    query: &StudyQuery,
    pb: &ProgressBar,
) -> Result<(Vec<FlatTrialRecord>, Summary), FetchError> {
    let transport = HttpTransport::new(config.studies_url(), config.timeout);
    log::info!("Fetching studies from {}", transport.url());
    run_with(transport, config, query, pb)
}

/// Same as [`run`] over an arbitrary transport
pub fn run_with<T: Transport>(
    transport: T,
    config: &Config,
    query: &StudyQuery,
    pb: &ProgressBar,
) -> Result<(Vec<FlatTrialRecord>, Summary), FetchError> {
    let start = Instant::now();
    let mut fetcher = PagedFetcher::new(transport, config.fetch.clone())?;

    pb.set_message("page 1...");
    let outcome = fetcher.fetch(query, |p| {
        pb.set_message(format!("page {} ({} studies)", p.page, fmt_num(p.total)));
    })?;

    pb.set_message("flattening...");
    let studies_fetched = outcome.studies.len();
    let (records, flatten) = flatten_studies(&outcome.studies);

    let summary = Summary {
        studies_fetched,
        pages: outcome.pages,
        requests: fetcher.requests_issued(),
        stop: outcome.stop,
        flatten,
        elapsed: start.elapsed(),
    };
    pb.finish_with_message(format!("{} trials", fmt_num(records.len())));
    summary.log();

    Ok((records, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchOptions;
    use serde_json::json;
    use trialscope_core::{HttpResponse, RetryPolicy, StreamError};

    struct OnePage(Option<String>);

    impl Transport for OnePage {
        fn get(&mut self, _query: &[(String, String)]) -> Result<HttpResponse, StreamError> {
            let body = self.0.take().unwrap_or_else(|| r#"{"studies": []}"#.to_string());
            Ok(HttpResponse { status: 200, body })
        }
    }

    fn config() -> Config {
        Config {
            fetch: FetchOptions {
                page_delay: Duration::ZERO,
                retry: RetryPolicy::immediate(),
                ..FetchOptions::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn run_with_flattens_and_counts() {
        let body = json!({
            "studies": [
                {"protocolSection": {"identificationModule": {"nctId": "NCT1"}}},
                {"protocolSection": {"identificationModule": {"nctId": "NCT1"}}},
                {"protocolSection": {"identificationModule": {"nctId": "NCT2"}}},
                {"protocolSection": {}}
            ]
        });
        let (records, summary) = run_with(
            OnePage(Some(body.to_string())),
            &config(),
            &StudyQuery::default(),
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(summary.studies_fetched, 4);
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.requests, 1);
        assert_eq!(summary.stop, StopReason::Exhausted);
        assert_eq!(summary.flatten.duplicates, 1);
        assert_eq!(summary.flatten.missing_id, 1);
    }

    #[test]
    fn invalid_page_size_fails_before_fetching() {
        let mut cfg = config();
        cfg.fetch.page_size = 0;
        let err = run_with(
            OnePage(None),
            &cfg,
            &StudyQuery::default(),
            &ProgressBar::hidden(),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn summary_log_does_not_panic() {
        let summary = Summary {
            studies_fetched: 0,
            pages: 0,
            requests: 0,
            stop: StopReason::Exhausted,
            flatten: FlattenStats::default(),
            elapsed: Duration::ZERO,
        };
        summary.log();
    }
}

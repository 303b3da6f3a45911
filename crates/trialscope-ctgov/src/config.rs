//! Registry client configuration

use std::time::Duration;

use crate::fetcher::FetchOptions;

/// ClinicalTrials.gov API v2 root
pub const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime configuration for a registry fetch
#[derive(Debug, Clone)]
pub struct Config {
    /// API root; `studies` is appended
    pub base_url: String,
    pub timeout: Duration,
    pub fetch: FetchOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            fetch: FetchOptions::default(),
        }
    }
}

impl Config {
    /// Full `/studies` endpoint URL
    pub fn studies_url(&self) -> String {
        format!("{}/studies", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.fetch.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.fetch.page_delay, DEFAULT_PAGE_DELAY);
        assert!(config.fetch.max_pages.is_none());
        assert!(config.fetch.max_records.is_none());
        assert_eq!(config.fetch.retry.max_retries, 6);
    }

    #[test]
    fn studies_url_with_and_without_slash() {
        let mut config = Config::default();
        assert_eq!(
            config.studies_url(),
            "https://clinicaltrials.gov/api/v2/studies"
        );
        config.base_url = "http://127.0.0.1:8080/api".to_string();
        assert_eq!(config.studies_url(), "http://127.0.0.1:8080/api/studies");
    }
}

//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use trialscope_core::RetryPolicy;
use trialscope_ctgov::FetchOptions;
use trialscope_enrich::Taxonomy;

/// Global configuration for trialscope
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub registry: RegistryConfig,
    pub retry: RetryConfig,
    pub taxonomy: TaxonomyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
    pub compression_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./data"),
            compression_level: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub page_size: u32,
    pub page_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: trialscope_ctgov::config::DEFAULT_BASE_URL.to_string(),
            page_size: trialscope_ctgov::fetcher::DEFAULT_PAGE_SIZE,
            page_delay_ms: trialscope_ctgov::fetcher::DEFAULT_PAGE_DELAY.as_millis() as u64,
            timeout_secs: trialscope_ctgov::config::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub rate_limit_wait_ms: u64,
    /// Unbounded when absent
    pub max_rate_limit_waits: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            backoff_base_ms: policy.backoff_base.as_millis() as u64,
            rate_limit_wait_ms: policy.rate_limit_wait.as_millis() as u64,
            max_rate_limit_waits: policy.max_rate_limit_waits,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            rate_limit_wait: Duration::from_millis(self.rate_limit_wait_ms),
            max_rate_limit_waits: self.max_rate_limit_waits,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// TOML override for the built-in keyword tables
    #[serde(deserialize_with = "deserialize_env_var")]
    pub path: Option<String>,
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./trialscope.toml (current directory)
    /// 2. ~/.config/trialscope/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("trialscope.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "trialscope") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Registry client settings with paging limits from the command line
    pub fn ctgov(&self, max_pages: Option<usize>, max_records: Option<usize>) -> trialscope_ctgov::Config {
        trialscope_ctgov::Config {
            base_url: self.registry.base_url.clone(),
            timeout: Duration::from_secs(self.registry.timeout_secs),
            fetch: FetchOptions {
                page_size: self.registry.page_size,
                max_pages,
                max_records,
                page_delay: Duration::from_millis(self.registry.page_delay_ms),
                retry: self.retry.policy(),
            },
        }
    }

    /// Taxonomy from `override_path`, else the configured path, else the built-in table
    pub fn taxonomy(&self, override_path: Option<&Path>) -> Result<Taxonomy> {
        let configured = self.taxonomy.path.as_deref().map(Path::new);
        match override_path.or(configured) {
            Some(path) => Taxonomy::load(path),
            None => Ok(Taxonomy::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("./data"));
        assert_eq!(config.output.compression_level, 3);
        assert_eq!(config.registry.page_size, 200);
        assert_eq!(config.registry.page_delay_ms, 120);
        assert_eq!(config.registry.timeout_secs, 60);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert!(config.taxonomy.path.is_none());
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("TRIALSCOPE_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${TRIALSCOPE_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("TRIALSCOPE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
default_dir = "/tmp/trials"
compression_level = 5

[registry]
page_size = 1000
page_delay_ms = 0

[retry]
max_retries = 2
max_rate_limit_waits = 10

[taxonomy]
path = "taxonomy.toml"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/trials"));
        assert_eq!(config.output.compression_level, 5);
        assert_eq!(config.registry.page_size, 1000);
        assert_eq!(config.registry.timeout_secs, 60);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.backoff_base_ms, 800);
        assert_eq!(config.retry.max_rate_limit_waits, Some(10));
        assert_eq!(config.taxonomy.path.as_deref(), Some("taxonomy.toml"));
    }

    #[test]
    fn ctgov_config_carries_limits() {
        let config = Config::default();
        let ctgov = config.ctgov(Some(3), None);
        assert_eq!(ctgov.fetch.max_pages, Some(3));
        assert_eq!(ctgov.fetch.max_records, None);
        assert_eq!(ctgov.fetch.page_delay, Duration::from_millis(120));
        assert_eq!(ctgov.studies_url(), "https://clinicaltrials.gov/api/v2/studies");
    }

    #[test]
    fn builtin_taxonomy_without_path() {
        let taxonomy = Config::default().taxonomy(None).unwrap();
        assert_eq!(taxonomy, Taxonomy::default());
    }
}

//! Trialscope CT.gov - ClinicalTrials.gov v2 registry client
//!
//! Builds study queries, pages through `/studies` with retry/backoff and
//! flattens the nested study documents into [`FlatTrialRecord`] rows.
//!
//! # Example
//!
//! ```ignore
//! use trialscope_ctgov::{Config, StudyQuery, run};
//!
//! let query = StudyQuery {
//!     overall_status: vec!["RECRUITING".into()],
//!     last_update_from: Some("2020-01-01".into()),
//!     ..Default::default()
//! };
//! let (records, summary) = run(&Config::default(), &query, &indicatif::ProgressBar::hidden())?;
//! println!("{} trials from {} pages", records.len(), summary.pages);
//! ```

pub mod config;
pub mod fetcher;
pub mod flatten;
pub mod path;
pub mod query;
pub mod record;
pub mod runner;

// Re-exports
pub use config::Config;
pub use fetcher::{
    FetchError, FetchOptions, FetchOutcome, FetchState, HttpTransport, PageProgress, PagedFetcher,
    StopReason, Transport,
};
pub use flatten::{FlattenStats, flatten_studies, flatten_study};
pub use query::StudyQuery;
pub use record::FlatTrialRecord;
pub use runner::{Summary, run, run_with};

/// One study document as returned by the registry, kept untyped.
pub type RawStudy = serde_json::Value;

//! Trialscope Core - shared infrastructure for the trial ingestion pipeline
//!
//! HTTP transport over a shared runtime, retry/backoff policy, logging,
//! progress reporting and Parquet output used by the registry client and
//! the enrichment stage.

pub mod accumulator;
pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod sink;

// Re-exports for convenience
pub use accumulator::{Accumulator, DEFAULT_BATCH_SIZE, write_rows};
pub use http::{HttpResponse, SHARED_RUNTIME, StreamError, get_with_query, http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{RetryPolicy, backoff_duration};
pub use sink::{ParquetSink, cleanup_tmp_files, is_valid_parquet};

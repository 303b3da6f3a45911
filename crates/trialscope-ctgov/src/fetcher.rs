//! Cursor-paginated fetch of `/studies` with retry and backoff.
//!
//! One request is in flight at a time. The loop moves through
//! `Idle → Requesting → {Retrying ⇄ Requesting} → Completed | Failed`:
//!
//! - 429: fixed wait, same page again. Neither the page counter nor the
//!   transient retry budget is consumed.
//! - 5xx / connection failure: exponential backoff up to `max_retries`.
//! - any other non-2xx: fail immediately.

use std::time::Duration;

use serde_json::Value;
use trialscope_core::{HttpResponse, RetryPolicy, StreamError, get_with_query};

use crate::RawStudy;
use crate::query::StudyQuery;

pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Pause between successful pages
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(120);

/// Longest response body excerpt carried in error messages
const ERROR_BODY_EXCERPT: usize = 200;

/// One GET against the studies endpoint.
///
/// Implementations return every HTTP status as a response; only failures
/// to get a response at all are errors.
pub trait Transport {
    fn get(&mut self, query: &[(String, String)]) -> Result<HttpResponse, StreamError>;
}

/// Production transport over the shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn get(&mut self, query: &[(String, String)]) -> Result<HttpResponse, StreamError> {
        get_with_query(&self.url, query, self.timeout)
    }
}

/// Fetch failure. Every variant aborts the run.
#[derive(Debug)]
pub enum FetchError {
    /// Invalid caller-supplied option; raised before any request
    Config(String),
    /// Retry budget for transient failures exhausted on one page
    Transient { attempts: u32, last: StreamError },
    /// Rate-limit waits exceeded the configured bound
    RateLimited { waits: u32 },
    /// Response body does not have the expected shape
    Protocol(String),
    /// Non-retryable HTTP status
    Http { status: u16, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid fetch configuration: {msg}"),
            Self::Transient { attempts, last } => {
                write!(f, "giving up after {attempts} attempts: {last}")
            }
            Self::RateLimited { waits } => {
                write!(f, "still rate limited after {waits} waits")
            }
            Self::Protocol(msg) => write!(f, "unexpected registry response: {msg}"),
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transient { last, .. } => Some(last),
            _ => None,
        }
    }
}

/// Paging limits and pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Records per page, `1..=1000`
    pub page_size: u32,
    pub max_pages: Option<usize>,
    /// Stop once this many records are collected; the result is truncated to exactly this
    pub max_records: Option<usize>,
    /// Sleep between successful pages (not between retries)
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            max_records: None,
            page_delay: DEFAULT_PAGE_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchOptions {
    pub fn validate(&self) -> Result<(), FetchError> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(FetchError::Config(format!(
                "page size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Where the fetch loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Requesting,
    Retrying,
    Completed,
    Failed,
}

/// Why a completed fetch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Last page carried no `nextPageToken`
    Exhausted,
    PageCap,
    RecordCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted => write!(f, "no more pages"),
            Self::PageCap => write!(f, "page cap reached"),
            Self::RecordCap => write!(f, "record cap reached"),
        }
    }
}

/// Result of a completed fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub studies: Vec<RawStudy>,
    pub pages: usize,
    pub stop: StopReason,
}

/// Snapshot passed to the per-page callback
#[derive(Debug, Clone, Copy)]
pub struct PageProgress {
    pub page: usize,
    pub batch_len: usize,
    pub total: usize,
}

/// One parsed page
#[derive(Debug)]
struct Page {
    studies: Vec<RawStudy>,
    next_page_token: Option<String>,
}

/// Sequential cursor-driven fetcher over a [`Transport`]
pub struct PagedFetcher<T: Transport> {
    transport: T,
    options: FetchOptions,
    state: FetchState,
    requests: usize,
    sleeper: Box<dyn FnMut(Duration)>,
}

impl<T: Transport> PagedFetcher<T> {
    /// Validates `options` before anything touches the network
    pub fn new(transport: T, options: FetchOptions) -> Result<Self, FetchError> {
        options.validate()?;
        Ok(Self {
            transport,
            options,
            state: FetchState::Idle,
            requests: 0,
            sleeper: Box::new(std::thread::sleep),
        })
    }

    /// Replace the blocking sleep used for page delays and retry waits
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Requests sent so far, retries included
    pub fn requests_issued(&self) -> usize {
        self.requests
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every page matching `query`, subject to the page and record caps.
    pub fn fetch(
        &mut self,
        query: &StudyQuery,
        mut on_page: impl FnMut(PageProgress),
    ) -> Result<FetchOutcome, FetchError> {
        let params = query.to_params(self.options.page_size);
        let mut studies: Vec<RawStudy> = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(&params, token.as_deref())?;
            let batch_len = page.studies.len();
            studies.extend(page.studies);
            token = page.next_page_token;
            pages += 1;

            log::debug!(
                "page {pages}: {batch_len} studies ({} total)",
                studies.len()
            );
            on_page(PageProgress {
                page: pages,
                batch_len,
                total: studies.len(),
            });

            let stop = match (self.options.max_records, self.options.max_pages) {
                (Some(max), _) if studies.len() >= max => {
                    studies.truncate(max);
                    Some(StopReason::RecordCap)
                }
                (_, Some(max)) if pages >= max => Some(StopReason::PageCap),
                _ if token.is_none() => Some(StopReason::Exhausted),
                _ => None,
            };

            if let Some(stop) = stop {
                self.state = FetchState::Completed;
                log::info!(
                    "Fetched {} studies in {pages} pages ({stop})",
                    studies.len()
                );
                return Ok(FetchOutcome {
                    studies,
                    pages,
                    stop,
                });
            }

            self.pause(self.options.page_delay);
        }
    }

    /// Request one page until it succeeds or the retry policy gives up
    fn fetch_page(
        &mut self,
        params: &[(String, String)],
        token: Option<&str>,
    ) -> Result<Page, FetchError> {
        let mut query = params.to_vec();
        if let Some(token) = token {
            query.push(("pageToken".to_string(), token.to_string()));
        }

        let retry = self.options.retry;
        let mut attempt = 0u32;
        let mut rate_limit_waits = 0u32;

        loop {
            self.state = FetchState::Requesting;
            self.requests += 1;

            let failure = match self.transport.get(&query) {
                Ok(resp) if resp.status == 429 => {
                    if !retry.allows_rate_limit_wait(rate_limit_waits) {
                        return Err(self.fail(FetchError::RateLimited {
                            waits: rate_limit_waits,
                        }));
                    }
                    rate_limit_waits += 1;
                    log::warn!(
                        "rate limited (429), waiting {:?} before retrying the same page",
                        retry.rate_limit_wait
                    );
                    self.state = FetchState::Retrying;
                    self.pause(retry.rate_limit_wait);
                    continue;
                }
                Ok(resp) if resp.is_success() => {
                    return parse_page(&resp.body).map_err(|e| self.fail(e));
                }
                Ok(resp) => {
                    let err = StreamError::Http {
                        status: Some(resp.status),
                        message: excerpt(&resp.body),
                    };
                    if !err.is_retryable() {
                        return Err(self.fail(FetchError::Http {
                            status: resp.status,
                            message: excerpt(&resp.body),
                        }));
                    }
                    err
                }
                Err(e) => e,
            };

            if !failure.is_retryable() || attempt >= retry.max_retries {
                return Err(self.fail(FetchError::Transient {
                    attempts: attempt + 1,
                    last: failure,
                }));
            }

            attempt += 1;
            let delay = retry.backoff(attempt);
            log::warn!(
                "request failed ({failure}), retry {attempt}/{} in {delay:?}",
                retry.max_retries
            );
            self.state = FetchState::Retrying;
            self.pause(delay);
        }
    }

    fn pause(&mut self, d: Duration) {
        if !d.is_zero() {
            (self.sleeper)(d);
        }
    }

    fn fail(&mut self, err: FetchError) -> FetchError {
        self.state = FetchState::Failed;
        log::error!("fetch failed: {err}");
        err
    }
}


fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract the `studies` batch and the next cursor.
///
/// A missing `studies` field is an empty batch; a present but non-list one
/// is a protocol violation.
fn parse_page(body: &str) -> Result<Page, FetchError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Protocol(format!("invalid JSON: {e}")))?;
    let Value::Object(mut map) = payload else {
        return Err(FetchError::Protocol(format!(
            "expected a JSON object, got {}",
            json_kind(&payload)
        )));
    };

    let studies = match map.remove("studies") {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(FetchError::Protocol(format!(
                "'studies' is not a list (got {})",
                json_kind(&other)
            )));
        }
    };

    let next_page_token = map
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from);

    Ok(Page {
        studies,
        next_page_token,
    })
}

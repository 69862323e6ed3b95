//! Typed errors for the market pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors surfaced by the pipeline orchestrator.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Query was missing or empty; rejected before the pipeline runs.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Fetch failed after exhausting retries.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The overall request deadline expired.
    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },
}

/// Errors from the fetch layer. A value of this type is the *final*
/// attempt's error, propagated verbatim once retries are exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-200 status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Single attempt exceeded its request timeout.
    #[error("timeout fetching {url}")]
    Timeout { url: String },
}

/// Errors from the image cache. The cache is best-effort; callers log
/// and continue on these.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

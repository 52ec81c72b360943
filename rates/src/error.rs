//! Rate service error types.

use thiserror::Error;

/// Errors that can occur while resolving the reference rate.
///
/// Every variant is non-fatal: sources surface these to the resolver, which
/// logs them and falls back to the next source or the last known-good value.
/// Nothing here crosses the resolver boundary.
#[derive(Debug, Error)]
pub enum RateError {
    /// Request could not complete (timeout, connection refused, TLS failure).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// Response body did not have the expected JSON shape.
    #[error("unexpected response shape: {0}")]
    Schema(String),

    /// Scraped text was missing, empty, or not a number.
    #[error("unparseable rate text: {0:?}")]
    Parse(String),

    /// Fetched value was zero, negative, or non-finite.
    #[error("invalid rate value: {0}")]
    InvalidRate(f64),
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

//! The resolved reference rate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{RateError, RateResult};

/// A resolved USD reference rate: units of local currency per 1 USD.
///
/// Constructed only through [`Rate::new`], which rejects zero, negative, and
/// non-finite values; an invalid fetch is "no value", never "value = 0".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    /// Local currency per 1 USD.
    pub value: f64,
    /// Name of the source that produced this value.
    pub source: String,
    /// When the value was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Rate {
    /// Create a validated rate.
    pub fn new(value: f64, source: impl Into<String>) -> RateResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(RateError::InvalidRate(value));
        }

        Ok(Self {
            value,
            source: source.into(),
            fetched_at: Utc::now(),
        })
    }
}

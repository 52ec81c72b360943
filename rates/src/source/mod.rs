//! Rate source port and implementations.

use async_trait::async_trait;

use crate::error::RateResult;
use crate::rate::Rate;

pub mod api;
pub mod scrape;

pub use api::ApiRateSource;
pub use scrape::ScrapeRateSource;

/// A data source in the fallback chain.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Source name, used in logs and in the resolved [`Rate`].
    fn name(&self) -> &str;

    /// Fetch the current rate. Errors are typed; the resolver is the only
    /// layer that swallows them.
    async fn fetch(&self) -> RateResult<Rate>;
}

/// Scriptable source for testing the resolver and scheduler.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    value: parking_lot::Mutex<Option<f64>>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// A source that always succeeds with `value`.
    pub fn returning(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: parking_lot::Mutex::new(Some(value)),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A source that always fails.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: parking_lot::Mutex::new(None),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Delay every fetch, for exercising in-flight refreshes.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the outcome of subsequent fetches; `None` makes them fail.
    pub fn set_value(&self, value: Option<f64>) {
        *self.value.lock() = value;
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> RateResult<Rate> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let value = *self.value.lock();
        match value {
            Some(value) => Rate::new(value, self.name.clone()),
            None => Err(crate::error::RateError::Schema(format!(
                "{} unavailable",
                self.name
            ))),
        }
    }
}

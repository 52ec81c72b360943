//! Fallback-chain orchestration and the last known-good value.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::rate::Rate;
use crate::source::RateSource;

/// Resolves the reference rate through an ordered fallback chain.
///
/// Sources are tried sequentially in construction order; the first success
/// wins and short-circuits the chain. The last known-good value is kept in a
/// single slot replaced in one write-lock swap, so concurrent readers always
/// observe either the pre- or post-refresh value. It never expires:
/// availability over strict freshness.
///
/// Every source error stops here. Callers get `None` only when no source has
/// ever succeeded, and must render a "rate unavailable" state instead of a
/// price.
pub struct RateResolver {
    sources: Vec<Arc<dyn RateSource>>,
    last_good: RwLock<Option<Rate>>,
}

impl RateResolver {
    /// Create a resolver over an ordered source chain.
    pub fn new(sources: Vec<Arc<dyn RateSource>>) -> Self {
        Self {
            sources,
            last_good: RwLock::new(None),
        }
    }

    /// Get the current rate.
    ///
    /// Serves the last known-good value when one exists; resolves
    /// synchronously only when nothing has ever been cached.
    pub async fn get(&self) -> Option<Rate> {
        if let Some(rate) = self.last_good.read().clone() {
            return Some(rate);
        }

        self.refresh().await
    }

    /// Run the fallback chain and update the last known-good value.
    ///
    /// Returns the newly resolved rate, or the previous one when every
    /// source fails. Never propagates an error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Option<Rate> {
        for source in &self.sources {
            match source.fetch().await {
                Ok(rate) => {
                    debug!(
                        source = source.name(),
                        value = rate.value,
                        "source returned rate"
                    );
                    *self.last_good.write() = Some(rate.clone());
                    return Some(rate);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "rate source failed");
                }
            }
        }

        let stale = self.last_good.read().clone();
        match &stale {
            Some(rate) => info!(value = rate.value, "all sources failed, keeping previous rate"),
            None => warn!("all sources failed and no rate has ever been resolved"),
        }

        stale
    }
}

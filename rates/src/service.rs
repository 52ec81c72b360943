//! Wiring: the rate service the storefront talks to.

use std::sync::Arc;

use crate::cache::RateCache;
use crate::config::RatesConfig;
use crate::error::RateResult;
use crate::rate::Rate;
use crate::resolver::RateResolver;
use crate::scheduler::{Clock, RefreshScheduler, SystemClock};
use crate::source::{ApiRateSource, RateSource, ScrapeRateSource};

/// The assembled rate service: API source with scrape fallback, shared
/// cache, resolver, and daily refresh scheduler.
///
/// Price rendering and checkout call [`get_rate`](Self::get_rate) and must
/// render a "rate unavailable" state on `None`, never a numeric price.
pub struct RateService {
    resolver: Arc<RateResolver>,
    scheduler: RefreshScheduler,
}

impl RateService {
    /// Assemble the service from configuration with the system clock.
    pub fn new(config: RatesConfig) -> RateResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Assemble the service with an injected clock.
    pub fn with_clock(config: RatesConfig, clock: Arc<dyn Clock>) -> RateResult<Self> {
        let cache = Arc::new(RateCache::new());
        let api = Arc::new(ApiRateSource::new(&config, cache.clone())?);
        let scrape = Arc::new(ScrapeRateSource::new(&config)?);

        let resolver = Arc::new(RateResolver::new(vec![
            api as Arc<dyn RateSource>,
            scrape as Arc<dyn RateSource>,
        ]));
        let scheduler = RefreshScheduler::new(
            resolver.clone(),
            cache,
            clock,
            config.refresh_interval,
        );

        Ok(Self {
            resolver,
            scheduler,
        })
    }

    /// Current rate, or `None` if no source has ever succeeded.
    pub async fn get_rate(&self) -> Option<Rate> {
        self.resolver.get().await
    }

    /// Force a run of the fallback chain.
    pub async fn refresh(&self) -> Option<Rate> {
        self.resolver.refresh().await
    }

    /// Start the daily refresh scheduler. Idempotent.
    pub fn start(&self) -> bool {
        self.scheduler.start()
    }

    /// Stop the scheduler.
    pub async fn stop(&self) {
        self.scheduler.stop().await
    }

    /// The underlying resolver, for hosts that wire their own scheduling.
    pub fn resolver(&self) -> Arc<RateResolver> {
        self.resolver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_config() -> RatesConfig {
        RatesConfig {
            api_url: "http://127.0.0.1:9/api/v1/dollar/bcv".to_string(),
            scrape_url: "http://127.0.0.1:9/".to_string(),
            http_timeout: Duration::from_secs(1),
            ..RatesConfig::default()
        }
    }

    #[tokio::test]
    async fn builds_from_default_config() {
        let service = RateService::new(RatesConfig::default()).unwrap();

        assert!(service.start());
        assert!(!service.start());
        service.stop().await;
    }

    #[tokio::test]
    async fn unreachable_sources_yield_none() {
        let service = RateService::new(unreachable_config()).unwrap();

        assert!(service.get_rate().await.is_none());
    }
}

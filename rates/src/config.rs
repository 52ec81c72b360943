//! Rate service configuration.

use std::time::Duration;

/// Configuration for the rate resolution service.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    /// Primary JSON endpoint publishing the reference rate.
    pub api_url: String,
    /// Central bank page scraped when the primary source fails.
    pub scrape_url: String,
    /// Timeout applied to every outbound request.
    pub http_timeout: Duration,
    /// How long a successful API fetch is memoized before the network is
    /// consulted again. Freshness itself is driven by the daily scheduler,
    /// not by this window.
    pub cache_ttl: chrono::Duration,
    /// Accept an invalid certificate chain from the scrape host. The central
    /// bank has served an incomplete chain for years; deployments that need
    /// the fallback against that host must opt in explicitly. Never enabled
    /// by default.
    pub accept_invalid_certs: bool,
    /// Cadence of the unconditional scheduled refresh.
    pub refresh_interval: Duration,
    /// Cache key under which the resolved rate is memoized.
    pub rate_key: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://pydolarve.org/api/v1/dollar/bcv".to_string(),
            scrape_url: "https://www.bcv.org.ve/".to_string(),
            http_timeout: Duration::from_secs(10),
            cache_ttl: chrono::Duration::hours(6),
            accept_invalid_certs: false,
            refresh_interval: Duration::from_secs(24 * 60 * 60),
            rate_key: "usd:bcv".to_string(),
        }
    }
}

impl RatesConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RATES_API_URL") {
            config.api_url = url;
        }

        if let Ok(url) = std::env::var("RATES_SCRAPE_URL") {
            config.scrape_url = url;
        }

        if let Ok(secs) = std::env::var("RATES_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.http_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("RATES_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse::<i64>() {
                config.cache_ttl = chrono::Duration::seconds(secs);
            }
        }

        if let Ok(flag) = std::env::var("RATES_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = flag == "1" || flag.eq_ignore_ascii_case("true");
        }

        if let Ok(secs) = std::env::var("RATES_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.refresh_interval = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("API URL cannot be empty".to_string());
        }

        if self.scrape_url.is_empty() {
            return Err("Scrape URL cannot be empty".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("HTTP timeout cannot be zero".to_string());
        }

        if self.cache_ttl <= chrono::Duration::zero() {
            return Err("Cache TTL must be positive".to_string());
        }

        if self.refresh_interval.is_zero() {
            return Err("Refresh interval cannot be zero".to_string());
        }

        if self.rate_key.is_empty() {
            return Err("Rate cache key cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RatesConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tls_bypass_is_off_by_default() {
        assert!(!RatesConfig::default().accept_invalid_certs);
    }

    #[test]
    fn empty_api_url_is_invalid() {
        let mut config = RatesConfig::default();
        config.api_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let mut config = RatesConfig::default();
        config.http_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}

//! Primary source: the JSON rate API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::cache::RateCache;
use crate::config::RatesConfig;
use crate::error::{RateError, RateResult};
use crate::rate::Rate;
use crate::source::RateSource;

/// Invalidation tag for entries memoized by this source.
pub const API_TAG: &str = "api";

const SOURCE_NAME: &str = "dollar-api";

/// Published payload. Only `price` is consumed.
#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: f64,
}

/// Fetches the reference rate from the primary JSON endpoint.
///
/// Successful fetches are memoized in the shared [`RateCache`] so that
/// consumer-triggered refreshes inside the TTL window skip the network. The
/// scheduler invalidates the memo before its daily tick, keeping that refresh
/// unconditional.
pub struct ApiRateSource {
    http: Client,
    url: String,
    cache: Arc<RateCache>,
    cache_key: String,
    cache_ttl: chrono::Duration,
}

impl ApiRateSource {
    /// Build the source from configuration.
    pub fn new(config: &RatesConfig, cache: Arc<RateCache>) -> RateResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            http,
            url: config.api_url.clone(),
            cache,
            cache_key: config.rate_key.clone(),
            cache_ttl: config.cache_ttl,
        })
    }
}

#[async_trait]
impl RateSource for ApiRateSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> RateResult<Rate> {
        if let Some(entry) = self.cache.get(&self.cache_key) {
            debug!(value = entry.rate.value, "serving memoized api rate");
            return Ok(entry.rate);
        }

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let rate = Rate::new(decode_price(&body)?, SOURCE_NAME)?;

        self.cache
            .set(self.cache_key.clone(), rate.clone(), self.cache_ttl, API_TAG);

        Ok(rate)
    }
}

fn decode_price(body: &[u8]) -> RateResult<f64> {
    let decoded: PriceResponse =
        serde_json::from_slice(body).map_err(|e| RateError::Schema(e.to_string()))?;
    Ok(decoded.price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_payload() {
        let body = br#"{"title":"BCV","price":36.5,"last_update":"2025-08-01"}"#;
        assert_eq!(decode_price(body).unwrap(), 36.5);
    }

    #[test]
    fn missing_price_is_schema_error() {
        let body = br#"{"title":"BCV","last_update":"2025-08-01"}"#;
        assert!(matches!(decode_price(body), Err(RateError::Schema(_))));
    }

    #[test]
    fn string_price_is_schema_error() {
        let body = br#"{"price":"36,50"}"#;
        assert!(matches!(decode_price(body), Err(RateError::Schema(_))));
    }

    #[test]
    fn non_json_body_is_schema_error() {
        assert!(matches!(
            decode_price(b"<html>maintenance</html>"),
            Err(RateError::Schema(_))
        ));
    }

    #[test]
    fn decoded_zero_is_rejected_by_rate() {
        let body = br#"{"price":0.0}"#;
        let price = decode_price(body).unwrap();
        assert!(Rate::new(price, SOURCE_NAME).is_err());
    }
}

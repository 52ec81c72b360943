//! Fallback source: the central bank's public page.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::RatesConfig;
use crate::error::{RateError, RateResult};
use crate::rate::Rate;
use crate::source::RateSource;

const SOURCE_NAME: &str = "bcv-page";

/// The published rate lives in a `<strong>` nested under `id="dolar"`.
const RATE_SELECTOR: &str = "#dolar strong";

/// Scrapes the reference rate off the central bank's homepage.
///
/// Expensive and fragile; the resolver only reaches for it after the API
/// source has failed. The page formats numbers with dot-thousands and
/// comma-decimal separators (`"1.234,56"` is 1234.56).
pub struct ScrapeRateSource {
    http: Client,
    url: String,
}

impl ScrapeRateSource {
    /// Build the source from configuration.
    ///
    /// When `accept_invalid_certs` is set, certificate validation is skipped
    /// for this client only. The upstream host has served an incomplete
    /// chain for years; the opt-in is a deployment decision, never a
    /// library default.
    pub fn new(config: &RatesConfig) -> RateResult<Self> {
        let mut builder = Client::builder().timeout(config.http_timeout);
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            url: config.scrape_url.clone(),
        })
    }
}

#[async_trait]
impl RateSource for ScrapeRateSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self) -> RateResult<Rate> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let value = extract_rate(&body)?;
        debug!(value, "scraped rate from page");

        Rate::new(value, SOURCE_NAME)
    }
}

fn extract_rate(html: &str) -> RateResult<f64> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(RATE_SELECTOR)
        .map_err(|_| RateError::Parse(format!("invalid selector {RATE_SELECTOR:?}")))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| RateError::Parse(format!("no element matching {RATE_SELECTOR:?}")))?;

    let text: String = element.text().collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(RateError::Parse("empty rate text".to_string()));
    }

    parse_decimal_comma(text)
}

/// Convert dot-thousands/comma-decimal text (`"1.234,56"`) to a float.
pub(crate) fn parse_decimal_comma(text: &str) -> RateResult<f64> {
    let normalized = text.trim().replace('.', "").replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|_| RateError::Parse(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_comma_decimal() {
        assert_eq!(parse_decimal_comma("36,33").unwrap(), 36.33);
    }

    #[test]
    fn parses_dot_thousands() {
        assert_eq!(parse_decimal_comma("1.234,56").unwrap(), 1234.56);
    }

    #[test]
    fn parses_surrounding_whitespace() {
        assert_eq!(parse_decimal_comma("  40,12\n").unwrap(), 40.12);
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(matches!(
            parse_decimal_comma("sin datos"),
            Err(RateError::Parse(_))
        ));
    }

    #[test]
    fn extracts_rate_from_page() {
        let html = r#"<html><body>
            <div id="dolar"><span><strong> 40,12 </strong></span></div>
        </body></html>"#;
        assert_eq!(extract_rate(html).unwrap(), 40.12);
    }

    #[test]
    fn missing_element_is_parse_error() {
        let html = "<html><body><div id=\"euro\"><strong>39,80</strong></div></body></html>";
        assert!(matches!(extract_rate(html), Err(RateError::Parse(_))));
    }

    #[test]
    fn empty_text_is_parse_error() {
        let html = "<html><body><div id=\"dolar\"><strong>  </strong></div></body></html>";
        assert!(matches!(extract_rate(html), Err(RateError::Parse(_))));
    }

    proptest! {
        #[test]
        fn parser_never_panics(text in "\\PC*") {
            let _ = parse_decimal_comma(&text);
        }
    }
}

//! Mercadia Rate Service
//!
//! Resolves the published USD reference rate that every price display and
//! checkout total depends on.
//!
//! # Features
//!
//! - Primary JSON API source with a scraped central-bank page as fallback
//! - Sequential fallback chain: first success wins, errors never propagate
//! - Last known-good value served even after its nominal TTL (availability
//!   over strict freshness)
//! - Keyed TTL cache with invalidation tags, memoizing API fetches
//! - Daily refresh scheduler aligned to local midnight, independent of
//!   consumer traffic
//!
//! # Example
//!
//! ```rust,ignore
//! use mercadia_rates::{RateService, RatesConfig};
//!
//! let service = RateService::new(RatesConfig::from_env())?;
//! service.start();
//!
//! // In price rendering / checkout:
//! match service.get_rate().await {
//!     Some(rate) => render_local_price(subtotal_usd * rate.value),
//!     None => render_rate_unavailable(),
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod rate;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod source;

pub use cache::{CacheEntry, RateCache};
pub use config::RatesConfig;
pub use error::{RateError, RateResult};
pub use rate::Rate;
pub use resolver::RateResolver;
pub use scheduler::{Clock, RefreshScheduler, SystemClock};
pub use service::RateService;
pub use source::{ApiRateSource, RateSource, ScrapeRateSource};

//! Operational probe for the rate resolution service.
//!
//! Runs the fallback chain once against the configured sources and prints
//! the outcome; with `--watch` it keeps the daily scheduler running so
//! operators can observe scheduled refreshes from a production host.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mercadia_rates::{RateService, RatesConfig};

#[derive(Parser)]
#[command(name = "ratecheck", about = "Probe the storefront's USD rate sources")]
struct Args {
    /// Keep the daily refresh scheduler running after the first probe.
    #[arg(long)]
    watch: bool,

    /// Emit logs as JSON, matching production formatting.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    if args.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = RatesConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return Err(anyhow::anyhow!("configuration error: {e}"));
    }

    info!(
        api_url = %config.api_url,
        scrape_url = %config.scrape_url,
        accept_invalid_certs = config.accept_invalid_certs,
        "probing rate sources"
    );

    let service = RateService::new(config)?;

    match service.refresh().await {
        Some(rate) => println!(
            "1 USD = {:.4} (source: {}, fetched {})",
            rate.value, rate.source, rate.fetched_at
        ),
        None => println!("rate unavailable: all sources failed"),
    }

    if args.watch {
        service.start();
        info!("scheduler running, press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
        service.stop().await;
    }

    Ok(())
}

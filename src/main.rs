use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::info;

use riftbound_scraper::{BatchCollector, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("riftbound_scraper=info".parse()?),
        )
        .init();

    info!("Starting Riftbound card scraper at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let config = Arc::new(Config::load()?);
    let mut collector = BatchCollector::from_config(config)?;

    // The collector has already logged the failure.
    let report = collector
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

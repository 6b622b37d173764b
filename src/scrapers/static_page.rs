//! Plain-HTTP pass over the card gallery, for pages that ship their cards in
//! the initial HTML.

use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;

use crate::browser::RawCard;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::utils::http::fetch_with_retry;

const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Fetch the target page without a browser and snapshot its card elements.
pub async fn fetch_static_cards(client: &Client, config: &Config) -> Result<Vec<RawCard>, ScrapeError> {
    info!("Fetching {} without a browser", config.target_url);

    let response = fetch_with_retry(client, &config.target_url, config.http.max_retries, RETRY_BASE_DELAY).await?;
    let html = response
        .text()
        .await
        .map_err(|e| ScrapeError::Http(format!("failed to read response body: {}", e)))?;

    let cards = parse_cards_html(&html, &config.card_selector)?;
    info!("Found {} card elements in static HTML", cards.len());
    Ok(cards)
}

/// `src`/`alt` of every element matching `selector`, in document order.
pub fn parse_cards_html(html: &str, selector: &str) -> Result<Vec<RawCard>, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector)
        .map_err(|e| ScrapeError::Config(format!("invalid card selector {:?}: {:?}", selector, e)))?;

    Ok(document
        .select(&selector)
        .map(|element| {
            let attrs = element.value();
            RawCard::new(
                attrs.attr("src").or_else(|| attrs.attr("data-src")).unwrap_or_default(),
                attrs.attr("alt").unwrap_or_default(),
            )
        })
        .collect())
}

use anyhow::anyhow;
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::ScrapeError;

pub fn create_client(config: &Config) -> Result<Client, ScrapeError> {
    ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .cookie_store(true)
        .build()
        .map_err(|e| ScrapeError::Http(format!("failed to build HTTP client: {}", e)))
}

/// GET `url`, retrying failures and non-success statuses with exponential
/// backoff (`base_delay`, doubling each attempt).
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    max_retries: u32,
    base_delay: Duration,
) -> Result<Response, ScrapeError> {
    let max_retries = max_retries.max(1);
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_retries {
        match client.get(url).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    return Ok(response);
                } else {
                    let status = response.status();
                    warn!("HTTP error {}: {}", status, url);
                    last_error = Some(anyhow!("HTTP error: {}", status));
                }
            }
            Err(e) => {
                error!("Request failed for {}: {}", url, e);
                last_error = Some(e.into());
            }
        }

        attempts += 1;
        if attempts < max_retries {
            let delay = base_delay * 2u32.pow(attempts - 1);
            warn!("Retrying in {:?}... (attempt {}/{})", delay, attempts + 1, max_retries);
            sleep(delay).await;
        }
    }

    let cause = last_error.unwrap_or_else(|| anyhow!("Max retries exceeded"));
    Err(ScrapeError::Http(format!(
        "failed to fetch {} after {} attempts: {}",
        url, max_retries, cause
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cards"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = create_client(&Config::default()).unwrap();
        let url = format!("{}/cards", server.uri());
        let response = fetch_with_retry(&client, &url, 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let client = create_client(&Config::default()).unwrap();
        let err = fetch_with_retry(&client, &server.uri(), 2, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
    }
}

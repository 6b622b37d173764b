//! Chrome-backed browser session using chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{js_string, Launcher, PageSession, RawCard};
use crate::config::{BrowserSettings, Config};
use crate::error::ScrapeError;

const SCROLL_TO_BOTTOM_SCRIPT: &str = r#"
(() => {
    const height = Math.max(
        document.body.scrollHeight,
        document.documentElement.scrollHeight,
        document.body.offsetHeight,
        document.documentElement.offsetHeight
    );
    window.scrollTo(0, height);
    return height;
})()
"#;

const NAVIGATION_STATUS_SCRIPT: &str = r#"
(() => {
    const nav = performance.getEntriesByType('navigation')[0];
    return nav && nav.responseStatus ? nav.responseStatus : 0;
})()
"#;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChromeLauncher {
    settings: BrowserSettings,
    user_agent: String,
}

impl ChromeLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.browser.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn browser_config(&self, headless: bool) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(self.settings.window_width, self.settings.window_height)
            .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Launch(format!("invalid browser config: {}", e)))
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn open(&self, headless: bool) -> Result<Box<dyn PageSession>, ScrapeError> {
        let config = self.browser_config(headless)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        // The handler drives the CDP connection and must keep running.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handle.abort();
                return Err(ScrapeError::Launch(format!("failed to open page: {}", e)));
            }
        };

        info!("Browser launched (headless: {})", headless);

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handle,
            navigation_timeout: self.settings.navigation_timeout(),
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handle: JoinHandle<()>,
    navigation_timeout: Duration,
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(ScrapeError::navigation(
                    url,
                    format!("timed out after {:?}", self.navigation_timeout),
                ))
            }
            Ok(Err(e)) => return Err(ScrapeError::navigation(url, e)),
            Ok(Ok(_)) => {}
        }

        // goto resolves on load even for error pages; check the document status.
        let status = self
            .evaluate(NAVIGATION_STATUS_SCRIPT)
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        if status >= 400 {
            return Err(ScrapeError::navigation(url, format!("HTTP status {}", status)));
        }

        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<RawCard>, ScrapeError> {
        let script = format!(
            r#"Array.from(document.querySelectorAll({})).map(el => ({{
                src: el.getAttribute('src') || el.getAttribute('data-src') || el.currentSrc || '',
                alt: el.getAttribute('alt') || ''
            }}))"#,
            js_string(selector)
        );
        let value = self.evaluate(&script).await?;
        serde_json::from_value(value)
            .map_err(|e| ScrapeError::Extraction(format!("unexpected element snapshot: {}", e)))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Extraction(format!("script failed: {}", e)))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.evaluate(SCROLL_TO_BOTTOM_SCRIPT).await.map(|_| ())
    }

    async fn wait_for_idle(&self, idle: Duration) -> Result<(), ScrapeError> {
        tokio::time::sleep(idle).await;
        loop {
            let state = self.evaluate("document.readyState").await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handle.abort();
        info!("Browser closed");
    }
}

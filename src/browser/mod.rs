//! Browser session abstractions.
//!
//! The collector only talks to [`Launcher`] and [`PageSession`], so a run can
//! be driven by Chrome in production and by a scripted page in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ScrapeError;

mod chrome;
pub mod scroll;

pub use chrome::{ChromeLauncher, ChromeSession};
pub use scroll::{drive_scroll, ScrollOutcome};

/// The two attributes read from each matched card element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl RawCard {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }
}

/// Starts a browser and hands back a single page.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn open(&self, headless: bool) -> Result<Box<dyn PageSession>, ScrapeError>;
}

/// One navigable page owned for the duration of a run.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Load `url`. Does not wait for lazily rendered content.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Snapshot of every element currently matching `selector`, in document
    /// order. An empty result is not an error.
    async fn query_all(&self, selector: &str) -> Result<Vec<RawCard>, ScrapeError>;

    /// Run a read-only script and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScrapeError>;

    /// Scroll the document to its current bottom.
    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError>;

    /// Give the page `idle` to fetch and render whatever the last scroll
    /// triggered. Callers bound this with their own timeout.
    async fn wait_for_idle(&self, idle: Duration) -> Result<(), ScrapeError>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, ScrapeError> {
        let script = format!("document.querySelectorAll({}).length", js_string(selector));
        let value = self.evaluate(&script).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| ScrapeError::Extraction(format!("element count was not a number: {}", value)))
    }

    /// Release the page and the browser behind it. Must not fail.
    async fn close(&mut self);
}

/// Quote `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

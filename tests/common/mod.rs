#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use riftbound_scraper::browser::{Launcher, PageSession, RawCard};
use riftbound_scraper::config::{Config, ScrollSettings};
use riftbound_scraper::ScrapeError;

pub const PAGE_URL: &str = "https://riftbound.example/en-us/tcg-cards/";

/// What the scripted gallery shows: `reveals[n]` is the full element list
/// after `n` scrolls (the last entry repeats).
#[derive(Clone, Default)]
pub struct Gallery {
    pub reveals: Vec<Vec<RawCard>>,
    /// Nothing is shown until this long after the session opens.
    pub render_delay: Duration,
    pub fail_launch: bool,
    pub fail_navigation: bool,
    pub fail_query: bool,
}

#[derive(Default)]
pub struct Activity {
    pub launches: AtomicU32,
    pub scrolls: AtomicU32,
    pub closed: AtomicBool,
}

impl Activity {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockLauncher {
    gallery: Gallery,
    activity: Arc<Activity>,
}

impl MockLauncher {
    pub fn new(gallery: Gallery) -> (Self, Arc<Activity>) {
        let activity = Arc::new(Activity::default());
        (
            Self {
                gallery,
                activity: activity.clone(),
            },
            activity,
        )
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn open(&self, _headless: bool) -> Result<Box<dyn PageSession>, ScrapeError> {
        self.activity.launches.fetch_add(1, Ordering::SeqCst);
        if self.gallery.fail_launch {
            return Err(ScrapeError::Launch("chrome not found".to_string()));
        }
        Ok(Box::new(MockPage {
            gallery: self.gallery.clone(),
            activity: self.activity.clone(),
            scrolls: AtomicU32::new(0),
            opened: Instant::now(),
        }))
    }
}

struct MockPage {
    gallery: Gallery,
    activity: Arc<Activity>,
    scrolls: AtomicU32,
    opened: Instant,
}

impl MockPage {
    fn visible(&self) -> Vec<RawCard> {
        if self.gallery.reveals.is_empty() || self.opened.elapsed() < self.gallery.render_delay {
            return Vec::new();
        }
        let scrolls = self.scrolls.load(Ordering::SeqCst) as usize;
        self.gallery.reveals[scrolls.min(self.gallery.reveals.len() - 1)].clone()
    }
}

#[async_trait]
impl PageSession for MockPage {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        if self.gallery.fail_navigation {
            return Err(ScrapeError::navigation(url, "HTTP status 503"));
        }
        Ok(())
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<RawCard>, ScrapeError> {
        if self.gallery.fail_query {
            return Err(ScrapeError::Extraction("target closed".to_string()));
        }
        Ok(self.visible())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, ScrapeError> {
        Ok(serde_json::json!(self.visible().len()))
    }

    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        self.activity.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_for_idle(&self, _idle: Duration) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn close(&mut self) {
        self.activity.closed.store(true, Ordering::SeqCst);
    }
}

pub fn card(n: usize, alt: &str) -> RawCard {
    RawCard::new(format!("https://cdn.example/cards/{}.png", n), alt)
}

pub fn test_config(output: &Path) -> Config {
    Config {
        target_url: PAGE_URL.to_string(),
        output_path: output.to_path_buf(),
        scroll: ScrollSettings {
            stability_rounds: 2,
            max_rounds: 10,
            idle_wait_ms: 0,
            wait_timeout_ms: 50,
            wait_retries: 1,
            initial_wait_ms: 100,
        },
        ..Config::default()
    }
}

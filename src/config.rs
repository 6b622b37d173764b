use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScrapeError;

pub const DEFAULT_TARGET_URL: &str = "https://riftbound.leagueoflegends.com/en-us/tcg-cards/";
pub const DEFAULT_CARD_SELECTOR: &str = r#"img[alt*="Color:"]"#;
pub const DEFAULT_OUTPUT_PATH: &str = "riftbound_cards.json";
/// Upper bound for `scroll.initial_wait_ms`; a run has no overall deadline.
pub const MAX_INITIAL_WAIT_MS: u64 = 600_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target_url")]
    pub target_url: String,
    #[serde(default = "default_card_selector")]
    pub card_selector: String,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Try a plain HTTP fetch before launching a browser.
    #[serde(default)]
    pub static_first: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub scroll: ScrollSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Falls back to chromiumoxide's own executable detection when unset.
    #[serde(default)]
    pub chrome_executable: Option<String>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Tuning for the scroll convergence driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollSettings {
    /// Consecutive non-growing rounds before the page counts as fully loaded.
    #[serde(default = "default_stability_rounds")]
    pub stability_rounds: u32,
    /// Hard cap on scroll rounds.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_wait_retries")]
    pub wait_retries: u32,
    /// How long to wait for the first matching element before scrolling.
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
}

fn default_target_url() -> String {
    DEFAULT_TARGET_URL.to_string()
}

fn default_card_selector() -> String {
    DEFAULT_CARD_SELECTOR.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_stability_rounds() -> u32 {
    3
}

fn default_max_rounds() -> u32 {
    60
}

fn default_idle_wait_ms() -> u64 {
    800
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

fn default_wait_retries() -> u32 {
    2
}

fn default_initial_wait_ms() -> u64 {
    15_000
}

fn default_http_timeout_secs() -> u64 {
    25
}

fn default_http_max_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            card_selector: default_card_selector(),
            output_path: default_output_path(),
            headless: true,
            static_first: false,
            user_agent: default_user_agent(),
            browser: BrowserSettings::default(),
            scroll: ScrollSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            stability_rounds: default_stability_rounds(),
            max_rounds: default_max_rounds(),
            idle_wait_ms: default_idle_wait_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            wait_retries: default_wait_retries(),
            initial_wait_ms: default_initial_wait_ms(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            max_retries: default_http_max_retries(),
        }
    }
}

impl ScrollSettings {
    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Config {
    /// Load configuration from defaults, an optional `riftbound.*` file and
    /// `RIFTBOUND__`-prefixed environment variables, in that order.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name("riftbound").required(false))
            // RIFTBOUND__SCROLL__MAX_ROUNDS=40, RIFTBOUND__HEADLESS=false, ...
            .add_source(
                config::Environment::with_prefix("RIFTBOUND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.target_url.trim().is_empty() {
            return Err(ScrapeError::Config("target_url is empty".to_string()));
        }
        if self.card_selector.trim().is_empty() {
            return Err(ScrapeError::Config("card_selector is empty".to_string()));
        }
        let scroll = &self.scroll;
        if scroll.stability_rounds == 0 {
            return Err(ScrapeError::Config(
                "scroll.stability_rounds must be at least 1".to_string(),
            ));
        }
        if scroll.initial_wait_ms > MAX_INITIAL_WAIT_MS {
            return Err(ScrapeError::Config(format!(
                "scroll.initial_wait_ms ({}) exceeds {}",
                scroll.initial_wait_ms, MAX_INITIAL_WAIT_MS
            )));
        }
        if scroll.max_rounds < scroll.stability_rounds {
            return Err(ScrapeError::Config(format!(
                "scroll.max_rounds ({}) is below scroll.stability_rounds ({})",
                scroll.max_rounds, scroll.stability_rounds
            )));
        }
        Ok(())
    }
}
